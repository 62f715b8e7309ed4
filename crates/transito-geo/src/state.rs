//! Federative unit (UF) definitions.

use crate::region::Region;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The 26 Brazilian states plus the Federal District.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[allow(missing_docs)]
pub enum State {
    AC,
    AL,
    AM,
    AP,
    BA,
    CE,
    DF,
    ES,
    GO,
    MA,
    MG,
    MS,
    MT,
    PA,
    PB,
    PE,
    PI,
    PR,
    RJ,
    RN,
    RO,
    RR,
    RS,
    SC,
    SE,
    SP,
    TO,
}

impl State {
    /// Returns all federative units in alphabetical order of their code.
    pub fn all() -> Vec<Self> {
        vec![
            Self::AC,
            Self::AL,
            Self::AM,
            Self::AP,
            Self::BA,
            Self::CE,
            Self::DF,
            Self::ES,
            Self::GO,
            Self::MA,
            Self::MG,
            Self::MS,
            Self::MT,
            Self::PA,
            Self::PB,
            Self::PE,
            Self::PI,
            Self::PR,
            Self::RJ,
            Self::RN,
            Self::RO,
            Self::RR,
            Self::RS,
            Self::SC,
            Self::SE,
            Self::SP,
            Self::TO,
        ]
    }

    /// Returns the two-letter abbreviation.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::AC => "AC",
            Self::AL => "AL",
            Self::AM => "AM",
            Self::AP => "AP",
            Self::BA => "BA",
            Self::CE => "CE",
            Self::DF => "DF",
            Self::ES => "ES",
            Self::GO => "GO",
            Self::MA => "MA",
            Self::MG => "MG",
            Self::MS => "MS",
            Self::MT => "MT",
            Self::PA => "PA",
            Self::PB => "PB",
            Self::PE => "PE",
            Self::PI => "PI",
            Self::PR => "PR",
            Self::RJ => "RJ",
            Self::RN => "RN",
            Self::RO => "RO",
            Self::RR => "RR",
            Self::RS => "RS",
            Self::SC => "SC",
            Self::SE => "SE",
            Self::SP => "SP",
            Self::TO => "TO",
        }
    }

    /// Returns the full name of the unit.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::AC => "Acre",
            Self::AL => "Alagoas",
            Self::AM => "Amazonas",
            Self::AP => "Amapá",
            Self::BA => "Bahia",
            Self::CE => "Ceará",
            Self::DF => "Distrito Federal",
            Self::ES => "Espírito Santo",
            Self::GO => "Goiás",
            Self::MA => "Maranhão",
            Self::MG => "Minas Gerais",
            Self::MS => "Mato Grosso do Sul",
            Self::MT => "Mato Grosso",
            Self::PA => "Pará",
            Self::PB => "Paraíba",
            Self::PE => "Pernambuco",
            Self::PI => "Piauí",
            Self::PR => "Paraná",
            Self::RJ => "Rio de Janeiro",
            Self::RN => "Rio Grande do Norte",
            Self::RO => "Rondônia",
            Self::RR => "Roraima",
            Self::RS => "Rio Grande do Sul",
            Self::SC => "Santa Catarina",
            Self::SE => "Sergipe",
            Self::SP => "São Paulo",
            Self::TO => "Tocantins",
        }
    }

    /// Returns the two-digit IBGE code.
    pub const fn ibge_code(&self) -> u8 {
        match self {
            Self::RO => 11,
            Self::AC => 12,
            Self::AM => 13,
            Self::RR => 14,
            Self::PA => 15,
            Self::AP => 16,
            Self::TO => 17,
            Self::MA => 21,
            Self::PI => 22,
            Self::CE => 23,
            Self::RN => 24,
            Self::PB => 25,
            Self::PE => 26,
            Self::AL => 27,
            Self::SE => 28,
            Self::BA => 29,
            Self::MG => 31,
            Self::ES => 32,
            Self::RJ => 33,
            Self::SP => 35,
            Self::PR => 41,
            Self::SC => 42,
            Self::RS => 43,
            Self::MS => 50,
            Self::MT => 51,
            Self::GO => 52,
            Self::DF => 53,
        }
    }

    /// Returns the macro-region the unit belongs to.
    ///
    /// The first digit of the IBGE code identifies the region.
    pub const fn region(&self) -> Region {
        match self.ibge_code() / 10 {
            1 => Region::Norte,
            2 => Region::Nordeste,
            3 => Region::Sudeste,
            4 => Region::Sul,
            _ => Region::CentroOeste,
        }
    }

    /// Parse a unit from its abbreviation, ignoring case and surrounding whitespace.
    pub fn from_code(code: &str) -> Option<Self> {
        let code = code.trim();
        Self::all()
            .into_iter()
            .find(|s| s.code().eq_ignore_ascii_case(code))
    }

    /// Parse a unit from its IBGE code.
    pub fn from_ibge_code(code: u8) -> Option<Self> {
        Self::all().into_iter().find(|s| s.ibge_code() == code)
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
