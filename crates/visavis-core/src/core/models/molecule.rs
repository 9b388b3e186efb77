use phf::{Map, phf_map};
use std::fmt;

/// Suffix appended to a molecule column name to form its activation flag name.
pub const ACTIVATION_SUFFIX: &str = "_act";

/// Intracellular species tracked per cell by the simulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Molecule {
    Vinf,
    Vrna,
    Vprot,
    Pirf3,
    Ifni,
    Pstat,
    Isg,
}

#[rustfmt::skip]
static MOLECULE_BY_COLUMN: Map<&'static str, Molecule> = phf_map! {
    "Vinf"  => Molecule::Vinf,
    "VRNA"  => Molecule::Vrna,
    "Vprot" => Molecule::Vprot,
    "pIRF3" => Molecule::Pirf3,
    "IFNi"  => Molecule::Ifni,
    "pSTAT" => Molecule::Pstat,
    "ISG"   => Molecule::Isg,
};

impl Molecule {
    pub const COUNT: usize = 7;

    /// Catalogue order, matching the column order written by the simulator.
    pub const ALL: [Molecule; Molecule::COUNT] = [
        Molecule::Vinf,
        Molecule::Vrna,
        Molecule::Vprot,
        Molecule::Pirf3,
        Molecule::Ifni,
        Molecule::Pstat,
        Molecule::Isg,
    ];

    pub fn column(self) -> &'static str {
        match self {
            Molecule::Vinf => "Vinf",
            Molecule::Vrna => "VRNA",
            Molecule::Vprot => "Vprot",
            Molecule::Pirf3 => "pIRF3",
            Molecule::Ifni => "IFNi",
            Molecule::Pstat => "pSTAT",
            Molecule::Isg => "ISG",
        }
    }

    /// Minimum level at which the species counts as active.
    ///
    /// Downstream analyses depend on these exact cutoffs; they are not uniform.
    pub fn activation_threshold(self) -> f64 {
        match self {
            Molecule::Vinf => 1.0,
            Molecule::Vrna => 3.0,
            Molecule::Vprot => 1.0,
            Molecule::Pirf3 => 3.0,
            Molecule::Ifni => 3.0,
            Molecule::Pstat => 1.0,
            Molecule::Isg => 3.0,
        }
    }

    /// Highest level listed individually in per-hour summaries.
    pub fn display_max(self) -> u32 {
        match self {
            Molecule::Vinf => 1,
            _ => 3,
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn is_active(self, level: f64) -> bool {
        level >= self.activation_threshold()
    }

    pub fn flag_name(self) -> String {
        format!("{}{}", self.column(), ACTIVATION_SUFFIX)
    }

    pub fn from_column(name: &str) -> Option<Self> {
        MOLECULE_BY_COLUMN.get(name).copied()
    }

    /// Resolves `"<column>_act"` to its molecule.
    pub fn from_flag_name(name: &str) -> Option<Self> {
        name.strip_suffix(ACTIVATION_SUFFIX)
            .and_then(Self::from_column)
    }
}

impl fmt::Display for Molecule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.column())
    }
}
