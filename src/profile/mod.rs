//! A user's personal details: name, date of birth and address.

mod core;
mod endpoints;
mod state;

pub use core::{
    Address, AddressForm, NewProfile, Profile, create_address_table, create_profile,
    create_profile_table, get_profile,
};
pub use endpoints::{
    get_profile_endpoint, update_address_endpoint, update_birth_date_endpoint,
    update_email_endpoint, update_name_endpoint,
};
pub use state::{State, create_state_table, list_states, list_states_endpoint, seed_states};
