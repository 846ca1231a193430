//! Address book service functions.
//!
//! Every write that sets `is_default` goes through a store operation that
//! clears the owner's other defaults in the same atomic step.

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::db::Store;
use crate::error::{AppError, Result};

use super::models::Address;
use super::requests::AddressRequest;

/// Required text fields of an address, trimmed
struct AddressFields {
    name: String,
    phone: String,
    city: String,
    governorate: String,
    street: String,
    building_number: Option<String>,
}

fn required(value: Option<String>, field: &str) -> Result<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::validation(format!("{} is required", field)))
}

fn validate_address(request: &AddressRequest) -> Result<AddressFields> {
    Ok(AddressFields {
        name: required(request.name.clone(), "name")?,
        phone: required(request.phone.clone(), "phone")?,
        city: required(request.city.clone(), "city")?,
        governorate: required(request.governorate.clone(), "governorate")?,
        street: required(request.street.clone(), "street")?,
        building_number: request
            .building_number
            .as_ref()
            .map(|b| b.trim().to_string())
            .filter(|b| !b.is_empty()),
    })
}

/// Load an address and check that `owner_id` owns it
async fn owned_address(store: &dyn Store, owner_id: Uuid, id: Uuid) -> Result<Address> {
    let address = store
        .get_address(id)
        .await?
        .ok_or_else(|| AppError::not_found("Address"))?;
    if address.owner_id != owner_id {
        return Err(AppError::forbidden("Address belongs to another user"));
    }
    Ok(address)
}

pub async fn create_address(
    store: &dyn Store,
    owner_id: Uuid,
    request: AddressRequest,
) -> Result<Address> {
    let fields = validate_address(&request)?;
    let now = Utc::now();

    let address = Address {
        id: Uuid::new_v4(),
        owner_id,
        name: fields.name,
        phone: fields.phone,
        city: fields.city,
        governorate: fields.governorate,
        street: fields.street,
        building_number: fields.building_number,
        is_default: request.is_default.unwrap_or(false),
        created_at: now,
        updated_at: now,
    };

    store.insert_address(&address).await?;
    info!("Created address {} for user {}", address.id, owner_id);
    Ok(address)
}

pub async fn update_address(
    store: &dyn Store,
    owner_id: Uuid,
    id: Uuid,
    request: AddressRequest,
) -> Result<Address> {
    let existing = owned_address(store, owner_id, id).await?;
    let fields = validate_address(&request)?;

    let address = Address {
        name: fields.name,
        phone: fields.phone,
        city: fields.city,
        governorate: fields.governorate,
        street: fields.street,
        building_number: fields.building_number,
        is_default: request.is_default.unwrap_or(existing.is_default),
        updated_at: Utc::now(),
        ..existing
    };

    if !store.update_address(&address).await? {
        return Err(AppError::not_found("Address"));
    }
    Ok(address)
}

/// Make `id` the owner's only default address
pub async fn set_default(store: &dyn Store, owner_id: Uuid, id: Uuid) -> Result<Address> {
    owned_address(store, owner_id, id).await?;

    store
        .set_default_address(owner_id, id)
        .await?
        .ok_or_else(|| AppError::not_found("Address"))
}

pub async fn list_addresses(store: &dyn Store, owner_id: Uuid) -> Result<Vec<Address>> {
    store.list_addresses(owner_id).await
}

pub async fn get_address(store: &dyn Store, owner_id: Uuid, id: Uuid) -> Result<Address> {
    owned_address(store, owner_id, id).await
}

pub async fn delete_address(store: &dyn Store, owner_id: Uuid, id: Uuid) -> Result<()> {
    owned_address(store, owner_id, id).await?;
    if !store.delete_address(id).await? {
        return Err(AppError::not_found("Address"));
    }
    Ok(())
}
