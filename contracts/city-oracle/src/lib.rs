//! City Oracle Contract
//!
//! Stores per-city circle rates published by a single admin. The off-chain
//! sync service keeps this set aligned with the external price feed; other
//! contracts read rates through `get_circle_rate`.

#![no_std]

use soroban_sdk::{
    contract, contracterror, contractimpl, contracttype, symbol_short, Address, Env, String,
    Symbol, Vec,
};

/// Contract errors
///
/// The numeric codes are part of the contract ABI: the sync service decodes
/// `Error(Contract, #N)` back into these variants.
#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum OracleError {
    Unauthorized = 1,
    AlreadyInitialized = 2,
    NotInitialized = 3,
    CityNotSupported = 4,
    CityAlreadyExists = 5,
    InvalidCityName = 6,
    CapacityExceeded = 7,
    InvalidCountry = 8,
}

/// A single city's rate record.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CityRecord {
    pub city_name: String,
    pub area: u64,
    /// Price scaled by 100 (two implied decimals).
    pub rate: u64,
    pub country: String,
    /// Ledger close time of the last add or update.
    pub timestamp: u64,
}

#[contracttype]
#[derive(Clone)]
pub enum DataKey {
    Admin,
    Cities,
}

/// Maximum number of cities the oracle tracks.
pub const MAX_CITIES: u32 = 32;

/// Maximum city name length in bytes.
pub const MAX_NAME_LEN: u32 = 32;

/// Maximum country length in bytes. An empty country is allowed.
pub const MAX_COUNTRY_LEN: u32 = 32;

const DAY_IN_LEDGERS: u32 = 17_280;
const INSTANCE_BUMP_AMOUNT: u32 = 30 * DAY_IN_LEDGERS;
const INSTANCE_LIFETIME_THRESHOLD: u32 = INSTANCE_BUMP_AMOUNT - DAY_IN_LEDGERS;

/// Event symbols
const INITIALIZED: Symbol = symbol_short!("init");
const CITY_ADDED: Symbol = symbol_short!("city_add");
const RATE_UPDATED: Symbol = symbol_short!("rate_upd");

#[contract]
pub struct CityOracle;

#[contractimpl]
impl CityOracle {
    /// Initialize the oracle with its admin and an empty city set.
    ///
    /// # Arguments
    /// * `admin` - The only address allowed to add cities or update rates
    ///
    /// # Events
    /// Emits `INITIALIZED` event
    pub fn initialize(env: Env, admin: Address) -> Result<(), OracleError> {
        if env.storage().instance().has(&DataKey::Admin) {
            return Err(OracleError::AlreadyInitialized);
        }

        admin.require_auth();

        env.storage().instance().set(&DataKey::Admin, &admin);
        env.storage()
            .instance()
            .set(&DataKey::Cities, &Vec::<CityRecord>::new(&env));
        Self::bump_instance(&env);

        env.events().publish((INITIALIZED,), (admin,));

        Ok(())
    }

    /// Register a new city (admin only).
    ///
    /// # Arguments
    /// * `caller` - Must be the stored admin and must authorize the call
    /// * `city_name` - Unique key, immutable once created
    /// * `area` - City area
    /// * `rate` - Scaled circle rate
    /// * `country` - Country name
    ///
    /// # Events
    /// Emits `CITY_ADDED` event
    pub fn add_city(
        env: Env,
        caller: Address,
        city_name: String,
        area: u64,
        rate: u64,
        country: String,
    ) -> Result<(), OracleError> {
        Self::check_admin(&env, &caller)?;
        Self::check_name(&city_name)?;
        if country.len() > MAX_COUNTRY_LEN {
            return Err(OracleError::InvalidCountry);
        }

        let mut cities = Self::get_cities(&env);

        if Self::position_of(&cities, &city_name).is_some() {
            return Err(OracleError::CityAlreadyExists);
        }
        if cities.len() >= MAX_CITIES {
            return Err(OracleError::CapacityExceeded);
        }

        cities.push_back(CityRecord {
            city_name: city_name.clone(),
            area,
            rate,
            country,
            timestamp: env.ledger().timestamp(),
        });

        env.storage().instance().set(&DataKey::Cities, &cities);
        Self::bump_instance(&env);

        env.events().publish((CITY_ADDED, city_name), rate);

        Ok(())
    }

    /// Replace the rate of an existing city (admin only).
    ///
    /// Area, country and name are left untouched; the timestamp is refreshed
    /// even when the rate does not change.
    ///
    /// # Events
    /// Emits `RATE_UPDATED` event
    pub fn update_city_rate(
        env: Env,
        caller: Address,
        city_name: String,
        rate: u64,
    ) -> Result<(), OracleError> {
        Self::check_admin(&env, &caller)?;

        let mut cities = Self::get_cities(&env);
        let index =
            Self::position_of(&cities, &city_name).ok_or(OracleError::CityNotSupported)?;

        let mut record = cities.get_unchecked(index);
        record.rate = rate;
        record.timestamp = env.ledger().timestamp();
        cities.set(index, record);

        env.storage().instance().set(&DataKey::Cities, &cities);
        Self::bump_instance(&env);

        env.events().publish((RATE_UPDATED, city_name), rate);

        Ok(())
    }

    /// Get the current rate of a city.
    pub fn get_circle_rate(env: Env, city_name: String) -> Result<u64, OracleError> {
        let cities = Self::get_cities(&env);
        Self::position_of(&cities, &city_name)
            .map(|index| cities.get_unchecked(index).rate)
            .ok_or(OracleError::CityNotSupported)
    }

    /// Get every tracked city in insertion order.
    pub fn get_city_list(env: Env) -> Vec<CityRecord> {
        Self::get_cities(&env)
    }

    /// Get admin address
    pub fn get_admin(env: Env) -> Result<Address, OracleError> {
        env.storage()
            .instance()
            .get(&DataKey::Admin)
            .ok_or(OracleError::NotInitialized)
    }

    // Helper functions

    fn check_admin(env: &Env, caller: &Address) -> Result<(), OracleError> {
        let admin: Address = env
            .storage()
            .instance()
            .get(&DataKey::Admin)
            .ok_or(OracleError::NotInitialized)?;

        caller.require_auth();

        if *caller != admin {
            return Err(OracleError::Unauthorized);
        }

        Ok(())
    }

    fn check_name(city_name: &String) -> Result<(), OracleError> {
        let len = city_name.len();
        if len == 0 || len > MAX_NAME_LEN {
            return Err(OracleError::InvalidCityName);
        }
        Ok(())
    }

    fn get_cities(env: &Env) -> Vec<CityRecord> {
        env.storage()
            .instance()
            .get(&DataKey::Cities)
            .unwrap_or(Vec::new(env))
    }

    fn position_of(cities: &Vec<CityRecord>, city_name: &String) -> Option<u32> {
        cities
            .iter()
            .position(|record| record.city_name == *city_name)
            .map(|index| index as u32)
    }

    fn bump_instance(env: &Env) {
        env.storage()
            .instance()
            .extend_ttl(INSTANCE_LIFETIME_THRESHOLD, INSTANCE_BUMP_AMOUNT);
    }
}
