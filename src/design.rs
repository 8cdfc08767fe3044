//! The immutable design value and its decode path.

use std::collections::BTreeMap;

use image::RgbaImage;

use crate::bitmap::BitmapCodec;
use crate::code::{CodeIdentity, DesignCode, DesignId};
use crate::compose::{compose, draw_scaled};
use crate::config::CodecConfig;
use crate::document::{DesignDocument, DocumentData, DocumentMeta};
use crate::error::DesignError;
use crate::palette::Palette;
use crate::variant::{Variant, NET_SIZE};

/// One packed tile-sized layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layer {
    name: String,
    width: u32,
    height: u32,
    bytes: Vec<u8>,
}

impl Layer {
    pub(crate) fn new(name: String, size: (u32, u32), bytes: Vec<u8>) -> Self {
        Self { name, width: size.0, height: size.1, bytes }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Packed nibble bytes, `width * height / 2` long
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Descriptive fields carried alongside the pixels.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DesignMeta {
    pub design_name: String,
    pub island_name: String,
    pub author_name: Option<String>,
    pub author_id: Option<u64>,
}

/// A fully validated design: variant, shared palette and packed layers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Design {
    id: Option<DesignId>,
    variant: &'static Variant,
    meta: DesignMeta,
    palette: Palette,
    layers: Vec<Layer>,
    created_at: Option<i64>,
    updated_at: Option<i64>,
}

impl Design {
    /// Callers guarantee one layer per packed slot, each resolvable in `palette`.
    pub(crate) fn new(variant: &'static Variant, meta: DesignMeta, palette: Palette, layers: Vec<Layer>) -> Self {
        Self {
            id: None,
            variant,
            meta,
            palette,
            layers,
            created_at: None,
            updated_at: None,
        }
    }

    /// Attach the id the design is stored under.
    pub fn with_id(mut self, id: DesignId) -> Self {
        self.id = Some(id);
        self
    }

    /// Validate a fetched document and build the design from it.
    ///
    /// Every layer must be present, exactly one tile long, and only use
    /// indices that the palette defines.
    pub fn from_document(doc: &DesignDocument, config: &CodecConfig) -> Result<Self, DesignError> {
        let variant = Variant::by_type_code(doc.meta.type_code)?;
        let palette = Palette::from_wire(&doc.data.palette)?;
        let codec = BitmapCodec::new(config);

        let valid: Vec<String> = (0..variant.layers).map(|i| i.to_string()).collect();
        if let Some(extra) = doc.data.layers.keys().find(|k| !valid.contains(k)) {
            return Err(DesignError::UnknownLayer { name: extra.clone(), valid });
        }

        let mut layers = Vec::with_capacity(variant.layers);
        for name in valid {
            let bytes = doc.data.layers.get(&name).ok_or_else(|| DesignError::MissingLayer {
                slot: name.clone(),
                variant: variant.name.to_string(),
            })?;
            for index in codec.unpack_indices(bytes)? {
                palette.resolve(index)?;
            }
            layers.push(Layer::new(name, codec.tile_size(), bytes.clone()));
        }

        Ok(Self {
            id: None,
            variant,
            meta: DesignMeta {
                design_name: doc.meta.design_name.clone(),
                island_name: doc.meta.island_name.clone(),
                author_name: doc.author_name.clone(),
                author_id: doc.author_id,
            },
            palette,
            layers,
            created_at: doc.created_at,
            updated_at: doc.updated_at,
        })
    }

    pub fn id(&self) -> Option<DesignId> {
        self.id
    }

    /// Design code for the stored id, if any.
    pub fn code(&self, identity: &CodeIdentity) -> Result<Option<DesignCode>, DesignError> {
        self.id.map(|id| identity.encode(id)).transpose()
    }

    pub fn variant(&self) -> &'static Variant {
        self.variant
    }

    pub fn meta(&self) -> &DesignMeta {
        &self.meta
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn num_layers(&self) -> usize {
        self.layers.len()
    }

    pub fn is_pro(&self) -> bool {
        self.variant.is_pro()
    }

    pub fn created_at(&self) -> Option<i64> {
        self.created_at
    }

    pub fn updated_at(&self) -> Option<i64> {
        self.updated_at
    }

    pub fn layer(&self, index: usize) -> Result<&Layer, DesignError> {
        self.layers.get(index).ok_or(DesignError::InvalidLayerIndex {
            index,
            num_layers: self.layers.len(),
        })
    }

    /// Decode one packed layer.
    pub fn render_layer(&self, index: usize, codec: &BitmapCodec) -> Result<RgbaImage, DesignError> {
        codec.unpack(self.layer(index)?.bytes(), &self.palette)
    }

    /// Decode every packed layer, in order.
    pub fn render_layers(&self, codec: &BitmapCodec) -> Result<Vec<RgbaImage>, DesignError> {
        self.layers
            .iter()
            .map(|layer| codec.unpack(layer.bytes(), &self.palette))
            .collect()
    }

    /// Decode and reassemble the user-facing parts.
    pub fn render_parts(&self, codec: &BitmapCodec) -> Result<Vec<(&'static str, RgbaImage)>, DesignError> {
        let layers = self.render_layers(codec)?;
        self.variant.externalize(&layers)
    }

    /// Decode a single part by name.
    pub fn render_part(&self, name: &str, codec: &BitmapCodec) -> Result<RgbaImage, DesignError> {
        if self.variant.part(name).is_none() {
            return Err(DesignError::UnknownLayer {
                name: name.to_string(),
                valid: self.variant.part_names(),
            });
        }
        self.render_parts(codec)?
            .into_iter()
            .find(|(part, _)| *part == name)
            .map(|(_, image)| image)
            .ok_or_else(|| DesignError::UnknownLayer {
                name: name.to_string(),
                valid: self.variant.part_names(),
            })
    }

    /// The parts laid out as the garment's pattern on a 240×240 canvas.
    pub fn net_image(&self, codec: &BitmapCodec) -> Result<RgbaImage, DesignError> {
        let parts = self.render_parts(codec)?;
        let mut canvas = RgbaImage::from_pixel(NET_SIZE.0, NET_SIZE.1, self.variant.net_backdrop());
        for placement in self.variant.placements() {
            if let Some((_, image)) = parts.iter().find(|(name, _)| *name == placement.part) {
                draw_scaled(&mut canvas, image, placement.pos, placement.size);
            }
        }
        Ok(canvas)
    }

    /// All packed layers stacked into one tile, layer 0 at the back.
    pub fn flatten(&self, config: &CodecConfig) -> Result<RgbaImage, DesignError> {
        let layers = self.render_layers(&BitmapCodec::new(config))?;
        let refs: Vec<&RgbaImage> = layers.iter().collect();
        compose(&refs, config)
    }

    /// Document form for upload.
    pub fn to_document(&self) -> DesignDocument {
        DesignDocument {
            meta: DocumentMeta {
                type_code: self.variant.type_code,
                design_name: self.meta.design_name.clone(),
                island_name: self.meta.island_name.clone(),
                pro: self.variant.is_pro(),
            },
            data: DocumentData {
                palette: self.palette.to_wire(),
                layers: self
                    .layers
                    .iter()
                    .map(|l| (l.name.clone(), l.bytes.clone()))
                    .collect::<BTreeMap<_, _>>(),
            },
            author_id: self.meta.author_id,
            author_name: self.meta.author_name.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}
