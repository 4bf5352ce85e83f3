// Service exports
pub mod adapter;
pub mod auth;
pub mod memory;
pub mod postgres;
pub mod source;
pub mod static_data;

pub use adapter::{adapt_cities, adapt_cities_with, AdapterError, CityRow};
pub use auth::{bearer_token, AuthError, JwtVerifier, RequestIdentity, SupabaseAuthClient, TokenResolver};
pub use memory::MemoryPreferenceStore;
pub use postgres::{PostgresClient, PostgresError};
pub use source::{CityDataSource, FallbackCitySource, SourceError, TalliedCitySource};
pub use static_data::{StaticCities, StaticDataError};
