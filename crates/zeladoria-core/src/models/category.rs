use serde::{Deserialize, Serialize};

/// Numeric category identifier as stored by the city API.
pub type CategoryId = u32;

/// Problem categories offered by the report form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Pothole,
    BurntOutStreetLight,
    DengueBreedingSite,
}

impl Category {
    pub const ALL: [Category; 3] = [
        Category::Pothole,
        Category::BurntOutStreetLight,
        Category::DengueBreedingSite,
    ];

    /// Get the database id of this category.
    pub fn id(&self) -> CategoryId {
        match self {
            Category::Pothole => 1,
            Category::BurntOutStreetLight => 2,
            Category::DengueBreedingSite => 3,
        }
    }

    /// Get the label shown to citizens.
    pub fn label(&self) -> &'static str {
        match self {
            Category::Pothole => "Buraco na Via",
            Category::BurntOutStreetLight => "Lâmpada Queimada",
            Category::DengueBreedingSite => "Foco de Dengue",
        }
    }

    pub fn from_id(id: CategoryId) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.id() == id)
    }
}
