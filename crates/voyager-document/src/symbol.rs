//! Enumerations persisted by their symbolic name.
//!
//! Reading is lenient: a name that does not match any variant maps to the
//! first variant of the enumeration instead of failing the whole document.

macro_rules! symbolic_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $($(#[$variant_meta:meta])* $variant:ident => $symbol:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub enum $name {
            $($(#[$variant_meta])* $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn name(self) -> &'static str {
                match self {
                    $($name::$variant => $symbol),+
                }
            }

            /// Exact (case sensitive) lookup.
            pub fn find(name: &str) -> Option<Self> {
                Self::ALL.iter().copied().find(|item| item.name() == name)
            }

            pub fn from_name(name: &str) -> Self {
                Self::find(name).unwrap_or(Self::ALL[0])
            }

            pub fn index(self) -> usize {
                self as usize
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::ALL[0]
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.name())
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.name())
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let name = <std::borrow::Cow<'de, str>>::deserialize(deserializer)?;
                Ok(Self::from_name(&name))
            }
        }
    };
}

symbolic_enum! {
    /// Context a derivative is meant for.
    pub enum DerivativeUsage {
        Web => "Web",
        Print => "Print",
        Editorial => "Editorial",
    }
}

symbolic_enum! {
    pub enum DerivativeQuality {
        Thumb => "Thumb",
        Low => "Low",
        Medium => "Medium",
        High => "High",
        Highest => "Highest",
        Lod => "LOD",
        Stream => "Stream",
    }
}

impl DerivativeQuality {
    /// Qualities which can stand in for each other, lowest first.
    pub const LADDER: &'static [DerivativeQuality] = &[
        DerivativeQuality::Thumb,
        DerivativeQuality::Low,
        DerivativeQuality::Medium,
        DerivativeQuality::High,
        DerivativeQuality::Highest,
    ];

    pub fn ladder_position(self) -> Option<usize> {
        Self::LADDER.iter().position(|quality| *quality == self)
    }
}

symbolic_enum! {
    pub enum AssetType {
        Model => "Model",
        Geometry => "Geometry",
        Image => "Image",
        Texture => "Texture",
        Points => "Points",
        Volume => "Volume",
    }
}

symbolic_enum! {
    /// Material channel fed by a texture asset.
    pub enum MapType {
        Color => "Color",
        Emissive => "Emissive",
        Occlusion => "Occlusion",
        Normal => "Normal",
        /// glTF packing: metalness in blue, roughness in green.
        MetallicRoughness => "MetallicRoughness",
        Zone => "Zone",
    }
}

symbolic_enum! {
    pub enum UnitType {
        Millimeter => "mm",
        Centimeter => "cm",
        Meter => "m",
        Kilometer => "km",
        Inch => "in",
        Foot => "ft",
        Yard => "yd",
        Mile => "mi",
    }
}

impl UnitType {
    pub fn to_meters(self) -> f32 {
        match self {
            UnitType::Millimeter => 0.001,
            UnitType::Centimeter => 0.01,
            UnitType::Meter => 1.0,
            UnitType::Kilometer => 1000.0,
            UnitType::Inch => 0.0254,
            UnitType::Foot => 0.3048,
            UnitType::Yard => 0.9144,
            UnitType::Mile => 1609.344,
        }
    }

    /// Factor converting a length in `self` into `target` units.
    pub fn scale_to(self, target: UnitType) -> f32 {
        self.to_meters() / target.to_meters()
    }
}

#[cfg(test)]
mod test {
    use super::{AssetType, DerivativeQuality, DerivativeUsage, MapType, UnitType};

    #[test]
    fn unknown_names_fall_back_to_first_variant() {
        assert_eq!(DerivativeUsage::from_name("Hologram"), DerivativeUsage::Web);
        assert_eq!(DerivativeQuality::from_name("high"), DerivativeQuality::Thumb);
        assert_eq!(AssetType::from_name(""), AssetType::Model);
        assert_eq!(MapType::from_name("Specular"), MapType::Color);
        assert_eq!(UnitType::from_name("parsec"), UnitType::Millimeter);
    }

    #[test]
    fn deserialize_is_lenient() {
        let quality: DerivativeQuality = serde_json::from_str("\"Ultra\"").unwrap();
        assert_eq!(quality, DerivativeQuality::Thumb);
        let quality: DerivativeQuality = serde_json::from_str("\"LOD\"").unwrap();
        assert_eq!(quality, DerivativeQuality::Lod);
        assert_eq!(serde_json::to_string(&quality).unwrap(), "\"LOD\"");
    }

    #[test]
    fn ladder_excludes_lod_and_stream() {
        assert_eq!(DerivativeQuality::Medium.ladder_position(), Some(2));
        assert_eq!(DerivativeQuality::Lod.ladder_position(), None);
        assert_eq!(DerivativeQuality::Stream.ladder_position(), None);
    }

    #[test]
    fn unit_scale() {
        assert!((UnitType::Meter.scale_to(UnitType::Centimeter) - 100.0).abs() < 1e-3);
        assert!((UnitType::Inch.scale_to(UnitType::Millimeter) - 25.4).abs() < 1e-4);
    }
}
