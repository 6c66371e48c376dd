use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::DomainError;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub id: Uuid,
    pub name: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub pincode: String,
    #[serde(default)]
    pub is_default: bool,
}

/// Address fields as submitted by the client on create and update.
#[derive(Deserialize, Serialize, Debug, Clone, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddressInput {
    pub name: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub pincode: String,
    #[serde(default)]
    pub is_default: bool,
}

impl AddressInput {
    /// Trims every field and checks the phone and pincode formats.
    pub fn normalize(mut self) -> Result<Self, DomainError> {
        for (label, field) in [
            ("Name", &mut self.name),
            ("Phone", &mut self.phone),
            ("Address", &mut self.address),
            ("City", &mut self.city),
            ("State", &mut self.state),
            ("Pincode", &mut self.pincode),
        ] {
            *field = field.trim().to_string();
            if field.is_empty() {
                return Err(DomainError::validation(format!("{label} is required")));
            }
        }

        if !is_digits(&self.phone, 10) {
            return Err(DomainError::validation("Phone must be 10 digits"));
        }
        if !is_digits(&self.pincode, 6) {
            return Err(DomainError::validation("Pincode must be 6 digits"));
        }

        Ok(self)
    }
}

fn is_digits(value: &str, len: usize) -> bool {
    value.len() == len && value.bytes().all(|b| b.is_ascii_digit())
}

fn clear_defaults(addresses: &mut [Address]) {
    for address in addresses.iter_mut() {
        address.is_default = false;
    }
}

fn find_mut(addresses: &mut [Address], id: Uuid) -> Result<&mut Address, DomainError> {
    addresses
        .iter_mut()
        .find(|address| address.id == id)
        .ok_or_else(|| DomainError::NotFound("Address".into()))
}

pub fn default_address(addresses: &[Address]) -> Option<&Address> {
    addresses.iter().find(|address| address.is_default)
}

/// Appends a new address. The first address always becomes the default.
pub fn add_address(addresses: &mut Vec<Address>, input: AddressInput) -> Result<Address, DomainError> {
    let input = input.normalize()?;
    let is_default = input.is_default || addresses.is_empty();

    if is_default {
        clear_defaults(addresses);
    }

    let address = Address {
        id: Uuid::new_v4(),
        name: input.name,
        phone: input.phone,
        address: input.address,
        city: input.city,
        state: input.state,
        pincode: input.pincode,
        is_default,
    };
    addresses.push(address.clone());

    Ok(address)
}

/// Overwrites an address. The default flag can be moved here, but unticking it
/// on the current default leaves it default.
pub fn update_address(
    addresses: &mut [Address],
    id: Uuid,
    input: AddressInput,
) -> Result<Address, DomainError> {
    let input = input.normalize()?;
    let was_default = find_mut(addresses, id)?.is_default;

    if input.is_default {
        clear_defaults(addresses);
    }

    let address = find_mut(addresses, id)?;
    address.name = input.name;
    address.phone = input.phone;
    address.address = input.address;
    address.city = input.city;
    address.state = input.state;
    address.pincode = input.pincode;
    address.is_default = input.is_default || was_default;

    Ok(address.clone())
}

/// Removes an address, promoting the first remaining one if the default was removed.
pub fn remove_address(addresses: &mut Vec<Address>, id: Uuid) -> Result<Address, DomainError> {
    let position = addresses
        .iter()
        .position(|address| address.id == id)
        .ok_or_else(|| DomainError::NotFound("Address".into()))?;
    let removed = addresses.remove(position);

    if removed.is_default {
        if let Some(first) = addresses.first_mut() {
            first.is_default = true;
        }
    }

    Ok(removed)
}

pub fn set_default(addresses: &mut [Address], id: Uuid) -> Result<Address, DomainError> {
    find_mut(addresses, id)?;
    clear_defaults(addresses);

    let address = find_mut(addresses, id)?;
    address.is_default = true;

    Ok(address.clone())
}
