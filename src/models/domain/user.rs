use serde::{Deserialize, Serialize};

/// Role carried in verified bearer-token claims. User accounts themselves
/// live with the external authentication collaborator; the engine only
/// consumes the identity and role of each request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    Learner,
    Admin,
}
