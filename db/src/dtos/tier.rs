use crate::models::tier::TierId;

/// Metadata patch applied when the provider reports a product change.
#[derive(Debug, Clone, PartialEq)]
pub struct TierUpdate {
    pub id: TierId,
    pub name: String,
    pub description: Option<String>,
    pub active: bool,
}
