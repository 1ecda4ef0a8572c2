//! Party management: clients and vendors, the clients list page, and the
//! create endpoint.

mod clients_page;
mod core;
mod create_endpoint;

pub use clients_page::get_clients_page;
pub use core::{
    NewParty, Party, PartyKind, create_party, create_party_table, get_clients, get_party,
    map_party_row,
};
pub use create_endpoint::{create_party_endpoint, get_new_client_page};

#[cfg(test)]
pub use core::test_client;
