use std::fmt;
use std::str::FromStr;

/// Hemisphere of the hadronic CM frame a multiplicity counts in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hemisphere {
    All,
    /// xF > 0
    Forward,
    /// xF < 0
    Backward,
}

/// Which hadrons a multiplicity counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChargeSelection {
    Total,
    Charged,
    Negative,
    Positive,
    Neutral,
}

/// Hadronic final state multiplicity kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Multiplicity {
    Total,
    TotalCharged,
    TotalNegative,
    TotalPositive,
    TotalNeutral,
    FwdTotal,
    FwdCharged,
    FwdNegative,
    FwdPositive,
    FwdNeutral,
    BkwTotal,
    BkwCharged,
    BkwNegative,
    BkwPositive,
    BkwNeutral,
}

const MULTIPLICITIES: [(Multiplicity, &str, Hemisphere, ChargeSelection); 15] = [
    (Multiplicity::Total, "total", Hemisphere::All, ChargeSelection::Total),
    (Multiplicity::TotalCharged, "total-charged", Hemisphere::All, ChargeSelection::Charged),
    (Multiplicity::TotalNegative, "total-negative", Hemisphere::All, ChargeSelection::Negative),
    (Multiplicity::TotalPositive, "total-positive", Hemisphere::All, ChargeSelection::Positive),
    (Multiplicity::TotalNeutral, "total-neutral", Hemisphere::All, ChargeSelection::Neutral),
    (Multiplicity::FwdTotal, "fwd-total", Hemisphere::Forward, ChargeSelection::Total),
    (Multiplicity::FwdCharged, "fwd-charged", Hemisphere::Forward, ChargeSelection::Charged),
    (Multiplicity::FwdNegative, "fwd-negative", Hemisphere::Forward, ChargeSelection::Negative),
    (Multiplicity::FwdPositive, "fwd-positive", Hemisphere::Forward, ChargeSelection::Positive),
    (Multiplicity::FwdNeutral, "fwd-neutral", Hemisphere::Forward, ChargeSelection::Neutral),
    (Multiplicity::BkwTotal, "bkw-total", Hemisphere::Backward, ChargeSelection::Total),
    (Multiplicity::BkwCharged, "bkw-charged", Hemisphere::Backward, ChargeSelection::Charged),
    (Multiplicity::BkwNegative, "bkw-negative", Hemisphere::Backward, ChargeSelection::Negative),
    (Multiplicity::BkwPositive, "bkw-positive", Hemisphere::Backward, ChargeSelection::Positive),
    (Multiplicity::BkwNeutral, "bkw-neutral", Hemisphere::Backward, ChargeSelection::Neutral),
];

impl Multiplicity {
    fn row(&self) -> &'static (Multiplicity, &'static str, Hemisphere, ChargeSelection) {
        // every variant has exactly one row, in declaration order
        &MULTIPLICITIES[*self as usize]
    }

    pub fn all() -> impl Iterator<Item = Multiplicity> {
        MULTIPLICITIES.iter().map(|row| row.0)
    }

    pub fn from_parts(hemisphere: Hemisphere, charge: ChargeSelection) -> Multiplicity {
        MULTIPLICITIES
            .iter()
            .find(|row| row.2 == hemisphere && row.3 == charge)
            .map(|row| row.0)
            .unwrap_or(Multiplicity::Total)
    }

    pub fn as_str(&self) -> &'static str {
        self.row().1
    }

    pub fn hemisphere(&self) -> Hemisphere {
        self.row().2
    }

    pub fn charge(&self) -> ChargeSelection {
        self.row().3
    }

    /// Whether a hadron with Feynman x `xf` and charge `charge` (units of e)
    /// is counted.
    pub fn counts(&self, xf: f64, charge: i32) -> bool {
        let in_hemisphere = match self.hemisphere() {
            Hemisphere::All => true,
            Hemisphere::Forward => xf > 0.0,
            Hemisphere::Backward => xf < 0.0,
        };
        let charge_ok = match self.charge() {
            ChargeSelection::Total => true,
            ChargeSelection::Charged => charge != 0,
            ChargeSelection::Negative => charge < 0,
            ChargeSelection::Positive => charge > 0,
            ChargeSelection::Neutral => charge == 0,
        };
        in_hemisphere && charge_ok
    }
}

impl fmt::Display for Multiplicity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Multiplicity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MULTIPLICITIES
            .iter()
            .find(|row| row.1 == s)
            .map(|row| row.0)
            .ok_or_else(|| format!("unknown multiplicity '{}'", s))
    }
}
