use std::fmt;
use std::str::FromStr;

/// Baryon resonances known to the resonance production models.
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BaryonResonance {
    P33_1232,
    S11_1535,
    D13_1520,
    S11_1650,
    D13_1700,
    D15_1675,
    S31_1620,
    D33_1700,
    P11_1440,
    P33_1600,
    P13_1720,
    F15_1680,
    P31_1910,
    P33_1920,
    F35_1905,
    F37_1950,
    P11_1710,
    F17_1970,
}

/// (resonance, name, mass GeV, width GeV, neutral state PDG code, is Delta)
const RESONANCE_TABLE: &[(BaryonResonance, &str, f64, f64, i32, bool)] = &[
    (BaryonResonance::P33_1232, "P33(1232)", 1.232, 0.120, 2114, true),
    (BaryonResonance::S11_1535, "S11(1535)", 1.535, 0.150, 22112, false),
    (BaryonResonance::D13_1520, "D13(1520)", 1.520, 0.115, 1214, false),
    (BaryonResonance::S11_1650, "S11(1650)", 1.655, 0.165, 32112, false),
    (BaryonResonance::D13_1700, "D13(1700)", 1.700, 0.100, 21214, false),
    (BaryonResonance::D15_1675, "D15(1675)", 1.675, 0.150, 2116, false),
    (BaryonResonance::S31_1620, "S31(1620)", 1.620, 0.150, 1212, true),
    (BaryonResonance::D33_1700, "D33(1700)", 1.700, 0.300, 12114, true),
    (BaryonResonance::P11_1440, "P11(1440)", 1.440, 0.350, 12112, false),
    (BaryonResonance::P33_1600, "P33(1600)", 1.600, 0.350, 32114, true),
    (BaryonResonance::P13_1720, "P13(1720)", 1.720, 0.150, 31214, false),
    (BaryonResonance::F15_1680, "F15(1680)", 1.680, 0.130, 12116, false),
    (BaryonResonance::P31_1910, "P31(1910)", 1.910, 0.250, 21212, true),
    (BaryonResonance::P33_1920, "P33(1920)", 1.920, 0.200, 22114, true),
    (BaryonResonance::F35_1905, "F35(1905)", 1.905, 0.350, 1216, true),
    (BaryonResonance::F37_1950, "F37(1950)", 1.950, 0.300, 2118, true),
    (BaryonResonance::P11_1710, "P11(1710)", 1.710, 0.100, 42112, false),
    (BaryonResonance::F17_1970, "F17(1970)", 1.970, 0.325, 12118, false),
];

impl BaryonResonance {
    fn row(&self) -> &'static (BaryonResonance, &'static str, f64, f64, i32, bool) {
        // every variant has exactly one table row
        RESONANCE_TABLE
            .iter()
            .find(|row| row.0 == *self)
            .unwrap_or(&RESONANCE_TABLE[0])
    }

    pub fn all() -> impl Iterator<Item = BaryonResonance> {
        RESONANCE_TABLE.iter().map(|row| row.0)
    }

    pub fn name(&self) -> &'static str {
        self.row().1
    }

    /// Nominal mass in GeV.
    pub fn mass(&self) -> f64 {
        self.row().2
    }

    /// Nominal width in GeV.
    pub fn width(&self) -> f64 {
        self.row().3
    }

    /// PDG code of the charge-neutral state.
    pub fn pdg_code(&self) -> i32 {
        self.row().4
    }

    /// True for isospin 3/2 (Delta) resonances.
    pub fn is_delta(&self) -> bool {
        self.row().5
    }
}

impl fmt::Display for BaryonResonance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BaryonResonance {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        RESONANCE_TABLE
            .iter()
            .find(|row| row.1 == s)
            .map(|row| row.0)
            .ok_or_else(|| format!("unknown baryon resonance '{}'", s))
    }
}

/// Ordered list of baryon resonances, e.g. the set a resonance model sums over.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BaryonResList {
    resonances: Vec<BaryonResonance>,
}

impl BaryonResList {
    pub fn new() -> Self {
        Self::default()
    }

    /// List holding every known resonance.
    pub fn all() -> Self {
        Self {
            resonances: BaryonResonance::all().collect(),
        }
    }

    /// Replace the list with resonances named in `list`, split on `delimiter`.
    ///
    /// Names containing commas would clash with the default delimiter, which is
    /// why resonance names use the `P33(1232)` form.
    pub fn decode_from_name_list(&mut self, list: &str, delimiter: &str) -> Result<(), String> {
        let decoded = list
            .split(delimiter)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::parse::<BaryonResonance>)
            .collect::<Result<Vec<_>, _>>()?;
        self.resonances = decoded;
        Ok(())
    }

    pub fn n_resonances(&self) -> usize {
        self.resonances.len()
    }

    pub fn resonance_name(&self, ires: usize) -> Option<&'static str> {
        self.resonances.get(ires).map(|r| r.name())
    }

    pub fn resonance_id(&self, ires: usize) -> Option<BaryonResonance> {
        self.resonances.get(ires).copied()
    }

    pub fn resonance_pdg_code(&self, ires: usize) -> Option<i32> {
        self.resonances.get(ires).map(|r| r.pdg_code())
    }

    pub fn iter(&self) -> impl Iterator<Item = &BaryonResonance> {
        self.resonances.iter()
    }

    pub fn clear(&mut self) {
        self.resonances.clear();
    }
}

impl fmt::Display for BaryonResList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Baryon resonance list ({} entries):", self.resonances.len())?;
        for (i, res) in self.resonances.iter().enumerate() {
            writeln!(
                f,
                "  [{}] {} (pdg {}, M = {:.3} GeV)",
                i,
                res.name(),
                res.pdg_code(),
                res.mass()
            )?;
        }
        Ok(())
    }
}
