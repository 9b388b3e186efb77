use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

const MINUTE: f64 = 1.0;
const HOUR: f64 = 60.0 * MINUTE;
const DAY: f64 = 24.0 * HOUR;

#[derive(Debug, Error)]
pub enum ParametersError {
    #[error("Parameter '{name}' must be finite, got {value}")]
    NotFinite { name: &'static str, value: f64 },

    #[error("Parameter '{name}' must be non-negative, got {value}")]
    Negative { name: &'static str, value: f64 },

    #[error("Unknown parameter: '{0}'")]
    UnknownKey(String),

    #[error("Failed to serialize parameters: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Failed to write parameters to '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
}

/// Reaction and transport rates handed to the simulator.
///
/// Rates are expressed per minute, the simulator's native time unit. The
/// serialized form is a flat JSON object keyed by the field names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Parameters {
    pub vinf_incr: f64,
    pub vinf_decr: f64,
    pub vrna_incr: f64,
    pub vrna_decr: f64,
    pub vprot_incr: f64,
    pub vprot_decr: f64,
    pub pirf3_incr: f64,
    pub pirf3_decr: f64,
    pub ifni_incr: f64,
    pub ifni_decr: f64,
    pub pstat_incr: f64,
    pub pstat_decr: f64,
    pub isg_incr: f64,
    pub isg_decr: f64,
    pub k_isg0: f64,
    pub mm_pstat: f64,
    pub die: f64,
    pub k_ifn_sec: f64,
    pub q_ifne: f64,
    pub vprot_inh_pirf3: f64,
    pub vprot_inh_ifni: f64,
    pub vprot_inh_pstat: f64,
    pub isg_inh_vrna: f64,
    pub isg_inh_vprot: f64,
    pub isg_pro_pirf3: f64,
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            vinf_incr: 0.25 / HOUR,
            vrna_incr: 0.5 / HOUR,
            vprot_incr: 0.167 / HOUR,

            pirf3_incr: 0.75 / HOUR,
            pirf3_decr: 0.125 / HOUR,

            ifni_incr: 0.75 / HOUR,
            ifni_decr: 0.25 / HOUR,

            mm_pstat: 500.0,
            pstat_incr: 40.0 / HOUR,
            pstat_decr: 10.0 / HOUR,

            isg_incr: 0.10 / HOUR,
            isg_decr: 0.033 / HOUR,

            q_ifne: 1.0 / DAY,
            k_ifn_sec: 5e5 / HOUR,

            vprot_inh_ifni: 2.0,
            vprot_inh_pirf3: 2.0,
            vprot_inh_pstat: 1.5,

            isg_inh_vrna: 2.0,
            isg_inh_vprot: 2.0,

            // transitions switched off in the reference set
            vinf_decr: 0.0,
            vrna_decr: 0.0,
            vprot_decr: 0.0,
            die: 0.0,
            k_isg0: 0.0,
            isg_pro_pirf3: 0.0,
        }
    }
}

impl Parameters {
    pub fn entries(&self) -> [(&'static str, f64); 25] {
        [
            ("vinf_incr", self.vinf_incr),
            ("vinf_decr", self.vinf_decr),
            ("vrna_incr", self.vrna_incr),
            ("vrna_decr", self.vrna_decr),
            ("vprot_incr", self.vprot_incr),
            ("vprot_decr", self.vprot_decr),
            ("pirf3_incr", self.pirf3_incr),
            ("pirf3_decr", self.pirf3_decr),
            ("ifni_incr", self.ifni_incr),
            ("ifni_decr", self.ifni_decr),
            ("pstat_incr", self.pstat_incr),
            ("pstat_decr", self.pstat_decr),
            ("isg_incr", self.isg_incr),
            ("isg_decr", self.isg_decr),
            ("k_isg0", self.k_isg0),
            ("mm_pstat", self.mm_pstat),
            ("die", self.die),
            ("k_ifn_sec", self.k_ifn_sec),
            ("q_ifne", self.q_ifne),
            ("vprot_inh_pirf3", self.vprot_inh_pirf3),
            ("vprot_inh_ifni", self.vprot_inh_ifni),
            ("vprot_inh_pstat", self.vprot_inh_pstat),
            ("isg_inh_vrna", self.isg_inh_vrna),
            ("isg_inh_vprot", self.isg_inh_vprot),
            ("isg_pro_pirf3", self.isg_pro_pirf3),
        ]
    }

    fn slot_mut(&mut self, key: &str) -> Option<&mut f64> {
        let slot = match key {
            "vinf_incr" => &mut self.vinf_incr,
            "vinf_decr" => &mut self.vinf_decr,
            "vrna_incr" => &mut self.vrna_incr,
            "vrna_decr" => &mut self.vrna_decr,
            "vprot_incr" => &mut self.vprot_incr,
            "vprot_decr" => &mut self.vprot_decr,
            "pirf3_incr" => &mut self.pirf3_incr,
            "pirf3_decr" => &mut self.pirf3_decr,
            "ifni_incr" => &mut self.ifni_incr,
            "ifni_decr" => &mut self.ifni_decr,
            "pstat_incr" => &mut self.pstat_incr,
            "pstat_decr" => &mut self.pstat_decr,
            "isg_incr" => &mut self.isg_incr,
            "isg_decr" => &mut self.isg_decr,
            "k_isg0" => &mut self.k_isg0,
            "mm_pstat" => &mut self.mm_pstat,
            "die" => &mut self.die,
            "k_ifn_sec" => &mut self.k_ifn_sec,
            "q_ifne" => &mut self.q_ifne,
            "vprot_inh_pirf3" => &mut self.vprot_inh_pirf3,
            "vprot_inh_ifni" => &mut self.vprot_inh_ifni,
            "vprot_inh_pstat" => &mut self.vprot_inh_pstat,
            "isg_inh_vrna" => &mut self.isg_inh_vrna,
            "isg_inh_vprot" => &mut self.isg_inh_vprot,
            "isg_pro_pirf3" => &mut self.isg_pro_pirf3,
            _ => return None,
        };
        Some(slot)
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.entries()
            .into_iter()
            .find(|(name, _)| *name == key)
            .map(|(_, value)| value)
    }

    pub fn set(&mut self, key: &str, value: f64) -> Result<(), ParametersError> {
        let slot = self
            .slot_mut(key)
            .ok_or_else(|| ParametersError::UnknownKey(key.to_string()))?;
        *slot = value;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ParametersError> {
        for (name, value) in self.entries() {
            if !value.is_finite() {
                return Err(ParametersError::NotFinite { name, value });
            }
            if value < 0.0 {
                return Err(ParametersError::Negative { name, value });
            }
        }
        Ok(())
    }

    pub fn to_json(&self) -> Result<String, ParametersError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Validates and writes the flat JSON payload to `path`.
    pub fn write_json(&self, path: &Path) -> Result<(), ParametersError> {
        self.validate()?;
        let payload = self.to_json()?;
        std::fs::write(path, payload).map_err(|e| ParametersError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })
    }
}
