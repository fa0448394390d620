use serde::{Deserialize, Serialize};

/// JWT claims issued by the auth service. `sub` is the user id.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    #[serde(default)]
    pub username: String,
    pub exp: usize,
}
