use crate::models::City;
use crate::services::adapter::{adapt_cities_with, AdapterError, CityRow};
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

/// Catalogue bundled into the binary
const EMBEDDED_CITIES: &str = include_str!("../../data/cities.toml");

#[derive(Debug, Error)]
pub enum StaticDataError {
    #[error("Failed to read city data file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse city data: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid city data: {0}")]
    Invalid(#[from] AdapterError),
}

#[derive(Debug, Deserialize)]
struct CityFile {
    cities: Vec<CityRow>,
}

/// Static city collection used as the fallback data source
#[derive(Debug, Clone)]
pub struct StaticCities {
    cities: Vec<City>,
}

impl StaticCities {
    /// Load the catalogue compiled into the binary
    pub fn embedded() -> Result<Self, StaticDataError> {
        Self::from_toml_str(EMBEDDED_CITIES)
    }

    /// Load a catalogue from a TOML file on disk
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, StaticDataError> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&contents)
    }

    /// Parse a catalogue. Every row must be valid; a bundled data set with
    /// a bad row is a build defect, not something to skip.
    pub fn from_toml_str(contents: &str) -> Result<Self, StaticDataError> {
        let file: CityFile = toml::from_str(contents)?;
        let cities = adapt_cities_with(file.cities, true)?;
        Ok(Self { cities })
    }

    /// Look a city up by id (exact, case-sensitive)
    pub fn get(&self, id: &str) -> Option<&City> {
        self.cities.iter().find(|city| city.id == id)
    }

    pub fn all(&self) -> &[City] {
        &self.cities
    }

    pub fn len(&self) -> usize {
        self.cities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cities.is_empty()
    }
}
