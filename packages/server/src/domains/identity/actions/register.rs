//! Register actions - validate a signup profile and store the new actor

use tracing::{info, instrument};

use crate::common::AppResult;
use crate::domains::identity::data::{OrganizationSignupInput, SamaritanSignupInput};
use crate::domains::identity::models::Actor;
use crate::domains::identity::validation::{
    validate_organization_signup, validate_samaritan_signup,
};
use crate::kernel::ServerDeps;

/// Register a receiving organization.
#[instrument(skip_all)]
pub async fn register_organization(
    input: &OrganizationSignupInput,
    deps: &ServerDeps,
) -> AppResult<Actor> {
    let actor = validate_organization_signup(input, deps.identities.as_ref()).await?;
    deps.identities.insert_actor(&actor).await?;

    info!(user_id = %actor.id(), username = %actor.identity.username, "Organization registered");
    Ok(actor)
}

/// Register a donor.
#[instrument(skip_all)]
pub async fn register_samaritan(
    input: &SamaritanSignupInput,
    deps: &ServerDeps,
) -> AppResult<Actor> {
    let actor = validate_samaritan_signup(input, deps.identities.as_ref()).await?;
    deps.identities.insert_actor(&actor).await?;

    info!(user_id = %actor.id(), username = %actor.identity.username, "Samaritan registered");
    Ok(actor)
}
