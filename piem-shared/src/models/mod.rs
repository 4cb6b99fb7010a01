/// Resource models
///
/// One module per collection. Each defines the stored record, its `create`
/// and `update` input types with their validation rules, and the
/// [`Resource`](crate::resource::Resource) implementation wiring them to the
/// generic service.
///
/// - `user`: accounts and roles
/// - `category`: owned categories with an active flag
/// - `inventory`: inventory items
/// - `supplier`: supplier contacts

pub mod category;
pub mod inventory;
pub mod supplier;
pub mod user;
