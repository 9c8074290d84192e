//! Company-scoped permission checks shared by the services.

use quizzes_common::{AppError, AppResult};
use quizzes_db::entities::{company, company_member};
use quizzes_db::repositories::CompanyRepository;

/// Require `user_id` to belong to the company.
pub(crate) async fn require_member(
    company_repo: &CompanyRepository,
    company_id: &str,
    user_id: &str,
) -> AppResult<company_member::Model> {
    company_repo
        .find_member(company_repo.db(), company_id, user_id)
        .await?
        .ok_or_else(|| AppError::Forbidden("Only company members can do this".to_string()))
}

/// Require `user_id` to be the owner or an administrator of the company.
pub(crate) async fn require_manager(
    company_repo: &CompanyRepository,
    company_id: &str,
    user_id: &str,
) -> AppResult<company_member::Model> {
    let member = company_repo
        .find_member(company_repo.db(), company_id, user_id)
        .await?
        .filter(|m| m.role.can_manage())
        .ok_or_else(|| {
            AppError::Forbidden(
                "Only the company owner or an administrator can do this".to_string(),
            )
        })?;

    Ok(member)
}

/// Require `user_id` to own the company.
pub(crate) fn require_owner(company: &company::Model, user_id: &str) -> AppResult<()> {
    if company.owner_id != user_id {
        return Err(AppError::Forbidden(
            "Only the company owner can do this".to_string(),
        ));
    }

    Ok(())
}
