use std::fmt;
use std::str::FromStr;

/// Weather models the bot can query. Each maps to the model-group name
/// the Open-Meteo forecast endpoint expects in its `models` parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelId {
    Gfs,
    Icon,
    Ecmwf,
    Jma,
    Gem,
    Ukmo,
    MeteoFrance,
    AccessG,
}

impl ModelId {
    pub const fn all() -> &'static [ModelId] {
        &[
            ModelId::Gfs,
            ModelId::Icon,
            ModelId::Ecmwf,
            ModelId::Jma,
            ModelId::Gem,
            ModelId::Ukmo,
            ModelId::MeteoFrance,
            ModelId::AccessG,
        ]
    }

    /// Identifier users type in `/forecast` and see in `/models`.
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelId::Gfs => "GFS",
            ModelId::Icon => "ICON",
            ModelId::Ecmwf => "ECMWF",
            ModelId::Jma => "JMA",
            ModelId::Gem => "GEM",
            ModelId::Ukmo => "UKMO",
            ModelId::MeteoFrance => "MeteoFrance",
            ModelId::AccessG => "ACCESS-G",
        }
    }

    /// Model-group name on the Open-Meteo side.
    pub fn api_name(&self) -> &'static str {
        match self {
            ModelId::Gfs => "gfs_seamless",
            ModelId::Icon => "icon_seamless",
            ModelId::Ecmwf => "ecmwf_ifs025",
            ModelId::Jma => "jma_seamless",
            ModelId::Gem => "gem_seamless",
            ModelId::Ukmo => "ukmo_seamless",
            ModelId::MeteoFrance => "meteofrance_seamless",
            ModelId::AccessG => "bom_access_global",
        }
    }

    /// Comma-separated list of every supported identifier, for user messages.
    pub fn supported_list() -> String {
        ModelId::all()
            .iter()
            .map(|m| m.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelId {
    type Err = ();

    // Matching is case-insensitive; the canonical spelling is what as_str returns.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_lowercase();
        match lower.as_str() {
            "gfs" => Ok(ModelId::Gfs),
            "icon" => Ok(ModelId::Icon),
            "ecmwf" => Ok(ModelId::Ecmwf),
            "jma" => Ok(ModelId::Jma),
            "gem" => Ok(ModelId::Gem),
            "ukmo" => Ok(ModelId::Ukmo),
            "meteofrance" => Ok(ModelId::MeteoFrance),
            "access-g" => Ok(ModelId::AccessG),
            _ => Err(()),
        }
    }
}
