use std::sync::Arc;

use meridian_market::{MarketplacePricing, SectorAdmin};

#[derive(Clone)]
pub struct AppState {
    pub pricing: Arc<MarketplacePricing>,
    pub admin: Arc<SectorAdmin>,
}
