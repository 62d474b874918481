use serde::{Deserialize, Serialize};

use crate::common::Options;

/// Donation category. Ids are stable and shared with clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "i32", try_from = "i32")]
pub enum Category {
    Food,
    Clothes,
    Books,
    Furniture,
    HouseholdItems,
    Electronics,
    Toys,
    MedicalSupplies,
    PetSupplies,
    Others,
}

/// Filter id meaning "every category". Not assignable to an item.
pub const ALL_CATEGORIES_ID: i32 = 0;

impl Category {
    pub const ALL: [Category; 10] = [
        Category::Food,
        Category::Clothes,
        Category::Books,
        Category::Furniture,
        Category::HouseholdItems,
        Category::Electronics,
        Category::Toys,
        Category::MedicalSupplies,
        Category::PetSupplies,
        Category::Others,
    ];

    pub fn id(&self) -> i32 {
        match self {
            Category::Food => 1,
            Category::Clothes => 2,
            Category::Books => 3,
            Category::Furniture => 4,
            Category::HouseholdItems => 5,
            Category::Electronics => 6,
            Category::Toys => 7,
            Category::MedicalSupplies => 8,
            Category::PetSupplies => 9,
            Category::Others => 10,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Category::Food => "Food",
            Category::Clothes => "Clothes",
            Category::Books => "Books",
            Category::Furniture => "Furniture",
            Category::HouseholdItems => "Household Items",
            Category::Electronics => "Electronics",
            Category::Toys => "Toys",
            Category::MedicalSupplies => "Medical Supplies",
            Category::PetSupplies => "Pet Supplies",
            Category::Others => "Others",
        }
    }

    pub fn from_id(id: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.id() == id)
    }

    /// Categories an item can be posted under.
    pub fn assignable_options() -> Options {
        Self::ALL.iter().map(|c| (c.id(), c.name())).collect()
    }

    /// Every filter choice, including "All".
    pub fn filter_options() -> Options {
        let mut options = Self::assignable_options();
        options.insert(ALL_CATEGORIES_ID, "All");
        options
    }
}

impl From<Category> for i32 {
    fn from(category: Category) -> Self {
        category.id()
    }
}

impl TryFrom<i32> for Category {
    type Error = String;

    fn try_from(id: i32) -> Result<Self, Self::Error> {
        Category::from_id(id).ok_or_else(|| format!("unknown category id {}", id))
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
