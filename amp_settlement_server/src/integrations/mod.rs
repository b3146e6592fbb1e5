pub mod checkout;
pub mod funded_projects;
