//! Column names shared by every source frame.
//!
//! Keys are `year` and `month` (`Int32`) and `state` (UF code, `String`).
//! Every measured variable is `Float64`.

/// Calendar year.
pub const YEAR: &str = "year";
/// Calendar month, 1-12.
pub const MONTH: &str = "month";
/// Two-letter federative unit code.
pub const STATE: &str = "state";

/// Accidents recorded by the PRF.
pub const ACCIDENTS: &str = "accidents";
/// Accidents with at least one death.
pub const FATAL_ACCIDENTS: &str = "fatal_accidents";
/// People injured in PRF-recorded accidents.
pub const INJURED: &str = "injured";
/// Deaths recorded by the PRF at the accident scene.
pub const PRF_DEATHS: &str = "prf_deaths";

/// Registered vehicles of every type.
pub const FLEET: &str = "fleet";
/// Registered automobiles.
pub const AUTOMOBILES: &str = "automobiles";
/// Registered motorcycles, scooters and mopeds.
pub const MOTORCYCLES: &str = "motorcycles";

/// Gross domestic product attributed to the month.
pub const GDP: &str = "gdp";

/// Traffic deaths registered by DataSUS.
pub const DATASUS_DEATHS: &str = "datasus_deaths";

/// Variables produced by the PRF accident summary.
pub const ACCIDENT_VARIABLES: [&str; 4] = [ACCIDENTS, FATAL_ACCIDENTS, INJURED, PRF_DEATHS];

/// Variables produced by the fleet loader.
pub const FLEET_VARIABLES: [&str; 3] = [FLEET, AUTOMOBILES, MOTORCYCLES];
