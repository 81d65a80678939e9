
//! Contains the header of a file,
//! which is the required attributes plus any number of user attributes.

use crate::meta::attribute::{
    self, Attribute, AttributeValue, AttributeKind, ChannelList, ChannelDescription,
    IntegerBounds, FloatRect, Chromaticities, EnvironmentMap, KeyCode, LineOrder,
    Matrix3x3, Matrix4x4, Preview, Rational, Text, TileDescription, TimeCode,
};
use crate::meta::{magic_number, version, StorageMode};
use crate::compression::Compression;
use crate::math::Vec2;
use crate::io::Read;
use crate::error::*;


/// Describes the pixel layout and contains all other attributes of a file.
/// Immutable once it was read.
#[derive(Debug, Clone, PartialEq)]
pub struct Header {

    /// Lines or tiles. Determined by the version word.
    pub storage: StorageMode,

    /// The channels, sorted by name.
    pub channels: ChannelList,

    /// How the pixel blocks are compressed.
    pub compression: Compression,

    /// The region for which pixel data exists, inclusive.
    pub data_window: IntegerBounds,

    /// The region intended for display, inclusive.
    pub display_window: IntegerBounds,

    /// In what order the blocks appear in the file.
    pub line_order: LineOrder,

    /// Aspect ratio of each pixel.
    pub pixel_aspect: f32,

    /// Center of the screen window.
    pub screen_window_center: Vec2<f32>,

    /// Width of the screen window.
    pub screen_window_width: f32,

    /// Size and levels of the tiles. Only present in tiled files.
    pub tiles: Option<TileDescription>,

    /// Every other attribute, in the order found in the file.
    pub user_attributes: Vec<Attribute>,
}


/// The names and mask bits of the attributes every file must contain.
pub mod standard_names {
    macro_rules! define_required_attribute_names {
        ( $($name: ident : $value: expr => $bit: expr),* ) => {

            /// Every required name with its bit, in canonical order.
            pub const ALL: &'static [(&'static str, u16)] = &[
                $( ($value, $bit) ),*
            ];

            $(
                /// The byte-string name of this required attribute as it appears in a file.
                pub const $name: &'static [u8] = $value.as_bytes();
            )*

            /// The bit of each required attribute in the required attribute mask.
            pub mod bit {
                $(
                    /// The mask bit of this required attribute.
                    pub const $name: u16 = $bit;
                )*
            }
        };
    }

    define_required_attribute_names! {
        CHANNELS: "channels" => 0x1,
        COMPRESSION: "compression" => 0x2,
        DATA_WINDOW: "dataWindow" => 0x4,
        DISPLAY_WINDOW: "displayWindow" => 0x8,
        LINE_ORDER: "lineOrder" => 0x10,
        PIXEL_ASPECT: "pixelAspectRatio" => 0x20,
        WINDOW_CENTER: "screenWindowCenter" => 0x40,
        WINDOW_WIDTH: "screenWindowWidth" => 0x80,
        TILES: "tiles" => 0x100
    }

    /// All bits a scan line file must have.
    pub const SCAN_LINE_MASK: u16 = 0xFF;

    /// All bits a tiled file must have.
    pub const TILED_MASK: u16 = SCAN_LINE_MASK | bit::TILES;

    /// The mask bit of a required attribute name.
    pub fn bit_of(name: &[u8]) -> Option<u16> {
        ALL.iter()
            .find(|(required, _)| required.as_bytes() == name)
            .map(|&(_, bit)| bit)
    }
}


macro_rules! define_indexed_getters {
    ( $( $getter: ident => $convert: ident -> $result: ty ),* ) => {
        impl Header {
            $(
                #[doc = concat!("The value of the user attribute at this index, see `AttributeValue::", stringify!($convert), "`.")]
                pub fn $getter(&self, index: usize) -> Result<$result> {
                    self.attribute(index)?.value.$convert()
                }
            )*
        }
    };
}

define_indexed_getters! {
    attribute_box2i => to_box2i -> IntegerBounds,
    attribute_box2f => to_box2f -> FloatRect,
    attribute_channel_list => to_channel_list -> ChannelList,
    attribute_chromaticities => to_chromaticities -> Chromaticities,
    attribute_compression => to_compression -> Compression,
    attribute_double => to_f64 -> f64,
    attribute_envmap => to_environment_map -> EnvironmentMap,
    attribute_float => to_f32 -> f32,
    attribute_int => to_i32 -> i32,
    attribute_keycode => to_key_code -> KeyCode,
    attribute_line_order => to_line_order -> LineOrder,
    attribute_m33f => to_m33f -> Matrix3x3,
    attribute_m44f => to_m44f -> Matrix4x4,
    attribute_preview => to_preview -> Preview,
    attribute_rational => to_rational -> Rational,
    attribute_string => to_text -> Text,
    attribute_string_vector => to_text_vector -> Vec<Text>,
    attribute_tiledesc => to_tile_description -> TileDescription,
    attribute_timecode => to_time_code -> TimeCode,
    attribute_v2i => to_v2i -> Vec2<i32>,
    attribute_v2f => to_v2f -> Vec2<f32>,
    attribute_v3i => to_v3i -> (i32, i32, i32),
    attribute_v3f => to_v3f -> (f32, f32, f32)
}


impl Header {

    /// An empty header for the specified storage mode.
    /// The required attributes still have to be added.
    pub fn new(storage: StorageMode) -> Self {
        Header {
            storage,
            channels: ChannelList::default(),
            compression: Compression::default(),
            data_window: IntegerBounds::default(),
            display_window: IntegerBounds::default(),
            line_order: LineOrder::Increasing,
            pixel_aspect: 1.0,
            screen_window_center: Vec2(0.0, 0.0),
            screen_window_width: 1.0,
            tiles: None,
            user_attributes: Vec::new(),
        }
    }

    /// Read the magic number, the version and all attributes,
    /// then check that every required attribute was found.
    pub fn read(read: &mut impl Read) -> Result<Self> {
        magic_number::validate(read)?;

        let storage = version::read(read)?;
        log::debug!("reading {} header", storage);

        let mut header = Header::new(storage);
        let mut found = 0_u16;

        while let Some(attribute) = attribute::read(read)? {
            found |= header.add_attribute(attribute);
        }

        header.validate(found)?;
        Ok(header)
    }

    /// Store a required attribute in its field and return its mask bit,
    /// or append any other attribute to the user attributes and return zero.
    /// A required name with a value of the wrong type is kept as a user attribute.
    /// The tile description is only required, and only accepted, in tiled files.
    pub fn add_attribute(&mut self, attribute: Attribute) -> u16 {
        use self::standard_names::bit;
        use self::AttributeValue as Value;

        let Attribute { name, value } = attribute;

        let value = match (standard_names::bit_of(name.bytes()), value) {
            (Some(bit::CHANNELS), Value::ChannelList(channels)) => { self.channels = channels; return bit::CHANNELS },
            (Some(bit::COMPRESSION), Value::Compression(compression)) => { self.compression = compression; return bit::COMPRESSION },
            (Some(bit::DATA_WINDOW), Value::IntegerBounds(window)) => { self.data_window = window; return bit::DATA_WINDOW },
            (Some(bit::DISPLAY_WINDOW), Value::IntegerBounds(window)) => { self.display_window = window; return bit::DISPLAY_WINDOW },
            (Some(bit::LINE_ORDER), Value::LineOrder(order)) => { self.line_order = order; return bit::LINE_ORDER },
            (Some(bit::PIXEL_ASPECT), Value::F32(aspect)) => { self.pixel_aspect = aspect; return bit::PIXEL_ASPECT },
            (Some(bit::WINDOW_CENTER), Value::FloatVec2(center)) => { self.screen_window_center = center; return bit::WINDOW_CENTER },
            (Some(bit::WINDOW_WIDTH), Value::F32(width)) => { self.screen_window_width = width; return bit::WINDOW_WIDTH },

            (Some(bit::TILES), Value::TileDescription(tiles)) if self.storage == StorageMode::Tiled => {
                self.tiles = Some(tiles);
                return bit::TILES
            },

            (required, value) => {
                if required.is_some() {
                    log::debug!("required attribute '{}' has type '{}', keeping it as user attribute", name, value.type_name());
                }

                value
            },
        };

        self.user_attributes.push(Attribute { name, value });
        0
    }

    /// Check that all required attributes of the storage mode were found
    /// and that both windows are not inverted.
    pub fn validate(&self, found: u16) -> UnitResult {
        let required = match self.storage {
            StorageMode::ScanLine => standard_names::SCAN_LINE_MASK,
            StorageMode::Tiled => standard_names::TILED_MASK,
        };

        let missing: Vec<&'static str> = standard_names::ALL.iter()
            .filter(|&&(_, bit)| required & bit != 0 && found & bit == 0)
            .map(|&(name, _)| name)
            .collect();

        if !missing.is_empty() {
            return Err(Error::MissingRequiredAttributes(missing));
        }

        if self.data_window.is_inverted() {
            return Err(Error::invalid(format!("data window {} is inverted", self.data_window)));
        }

        if self.display_window.is_inverted() {
            return Err(Error::invalid(format!("display window {} is inverted", self.display_window)));
        }

        Ok(())
    }

    /// Number of channels.
    pub fn channel_count(&self) -> usize {
        self.channels.list.len()
    }

    /// The channel at this index, in alphabetical order.
    pub fn channel(&self, index: usize) -> Result<&ChannelDescription> {
        self.channels.list.get(index).ok_or_else(|| Error::invalid_argument(format!(
            "channel index {} out of range, there are {} channels", index, self.channel_count()
        )))
    }

    /// The index of the channel with exactly this name.
    pub fn find_channel(&self, name: &str) -> Option<usize> {
        self.channels.find_index_of_channel(name)
    }

    /// Number of user attributes.
    pub fn attribute_count(&self) -> usize {
        self.user_attributes.len()
    }

    /// The user attribute at this index, in file order.
    pub fn attribute(&self, index: usize) -> Result<&Attribute> {
        self.user_attributes.get(index).ok_or_else(|| Error::invalid_argument(format!(
            "attribute index {} out of range, there are {} user attributes", index, self.attribute_count()
        )))
    }

    /// The index of the first user attribute with exactly this name.
    pub fn find_attribute(&self, name: &str) -> Option<usize> {
        self.user_attributes.iter().position(|attribute| attribute.name.eq(name))
    }

    /// The type tag of the user attribute at this index.
    pub fn attribute_kind(&self, index: usize) -> Result<AttributeKind> {
        Ok(self.attribute(index)?.value.kind())
    }

    /// The type name of the user attribute at this index, as found in the file.
    pub fn attribute_type_name(&self, index: usize) -> Result<std::borrow::Cow<'_, str>> {
        Ok(self.attribute(index)?.value.type_name())
    }

    /// Type name and raw bytes of the user attribute at this index,
    /// if its type is not known.
    pub fn attribute_custom(&self, index: usize) -> Result<(&Text, &[u8])> {
        self.attribute(index)?.value.to_custom()
    }
}


#[cfg(test)]
mod test {
    use super::*;
    use crate::meta::attribute::SampleType;

    fn complete(storage: StorageMode) -> (Header, u16) {
        let mut header = Header::new(storage);
        let mut found = 0;

        let attributes = vec![
            ("channels", AttributeValue::ChannelList(ChannelList::new(smallvec::smallvec![
                ChannelDescription::new("Y", SampleType::F16, false)
            ]))),
            ("compression", AttributeValue::Compression(Compression::ZIP16)),
            ("dataWindow", AttributeValue::IntegerBounds(IntegerBounds::new((0, 0), (9, 9)))),
            ("displayWindow", AttributeValue::IntegerBounds(IntegerBounds::new((0, 0), (9, 9)))),
            ("lineOrder", AttributeValue::LineOrder(LineOrder::Increasing)),
            ("pixelAspectRatio", AttributeValue::F32(1.0)),
            ("screenWindowCenter", AttributeValue::FloatVec2(Vec2(0.0, 0.0))),
            ("screenWindowWidth", AttributeValue::F32(1.0)),
            ("tiles", AttributeValue::TileDescription(TileDescription {
                tile_size: Vec2(16, 16),
                level_mode: attribute::LevelMode::Singular,
                rounding_mode: crate::math::RoundingMode::Down,
            })),
            ("owner", AttributeValue::Text(Text::from("someone"))),
        ];

        for (name, value) in attributes {
            found |= header.add_attribute(Attribute { name: Text::from(name), value });
        }

        (header, found)
    }

    #[test]
    fn full_masks(){
        let (tiled, found) = complete(StorageMode::Tiled);
        assert_eq!(found, standard_names::TILED_MASK);
        assert!(tiled.validate(found).is_ok());
        assert!(tiled.tiles.is_some());
        assert_eq!(tiled.attribute_count(), 1);

        let (scan_line, found) = complete(StorageMode::ScanLine);
        assert_eq!(found, standard_names::SCAN_LINE_MASK);
        assert!(scan_line.validate(found).is_ok());
        assert!(scan_line.tiles.is_none());

        // the tile description is a user attribute in scan line files
        assert_eq!(scan_line.attribute_count(), 2);
        assert_eq!(scan_line.find_attribute("tiles"), Some(0));
        assert_eq!(scan_line.find_attribute("owner"), Some(1));
    }

    #[test]
    fn each_missing_attribute_is_named(){
        for &(name, bit) in standard_names::ALL {
            let (header, found) = complete(StorageMode::Tiled);

            match header.validate(found & !bit) {
                Err(Error::MissingRequiredAttributes(missing)) => assert_eq!(missing, vec![ name ]),
                other => panic!("unexpected result for {}: {:?}", name, other),
            }
        }
    }

    #[test]
    fn wrong_type_is_a_user_attribute(){
        let mut header = Header::new(StorageMode::ScanLine);
        let bit = header.add_attribute(Attribute { name: Text::from("compression"), value: AttributeValue::I32(3) });

        assert_eq!(bit, 0);
        assert_eq!(header.compression, Compression::Uncompressed);
        assert_eq!(header.attribute_int(0).unwrap(), 3);
    }

    #[test]
    fn user_attributes_keep_file_order(){
        let mut header = Header::new(StorageMode::ScanLine);

        for name in &[ "zeta", "alpha", "mu" ] {
            header.add_attribute(Attribute { name: Text::from(*name), value: AttributeValue::F32(0.5) });
        }

        let names: Vec<String> = header.user_attributes.iter().map(|attribute| attribute.name.to_string()).collect();
        assert_eq!(names, vec![ "zeta", "alpha", "mu" ]);
        assert_eq!(header.find_attribute("mu"), Some(2));
        assert_eq!(header.find_attribute("nu"), None);
    }

    #[test]
    fn inverted_windows(){
        let (mut header, found) = complete(StorageMode::ScanLine);
        header.data_window = IntegerBounds::new((5, 0), (4, 9));
        assert!(matches!(header.validate(found), Err(Error::Invalid(_))));

        let (mut header, found) = complete(StorageMode::ScanLine);
        header.display_window = IntegerBounds::new((0, 9), (9, 0));
        assert!(matches!(header.validate(found), Err(Error::Invalid(_))));
    }

    #[test]
    fn indexed_getters(){
        let (header, _) = complete(StorageMode::Tiled);

        assert_eq!(header.attribute_kind(0).unwrap(), AttributeKind::String);
        assert_eq!(header.attribute_string(0).unwrap(), Text::from("someone"));
        assert!(matches!(header.attribute_v2f(0), Err(Error::AttributeTypeMismatch { .. })));
        assert!(matches!(header.attribute_string(7), Err(Error::InvalidArgument(_))));
        assert!(matches!(header.channel(1), Err(Error::InvalidArgument(_))));
        assert_eq!(header.channel(0).unwrap().name, Text::from("Y"));
    }

    #[test]
    fn required_bits(){
        assert_eq!(standard_names::bit_of(b"dataWindow"), Some(0x4));
        assert_eq!(standard_names::bit_of(b"datawindow"), None);
        assert_eq!(standard_names::DATA_WINDOW, b"dataWindow");
    }
}
