//! # Tilemaps — Layered Sparse Grids
//!
//! A [`Tilemap`] is a stack of layers, each a sparse map from cell
//! coordinate to [`Tile`]. Two companion components derive data from it:
//!
//! - [`TilemapRenderer`] bakes the layers into a drawable image. The bake and
//!   its per-tile image cache are never saved; after a load the renderer is
//!   dirty and rebuilds on first use.
//! - [`TilemapCollider2D`] merges occupied cells of one layer into collision
//!   rectangles. The result is saved so a game can run without regenerating.
//!
//! ## Document Encoding
//!
//! Coordinate maps are keyed by `"x,y"` strings. JSON objects have no
//! meaningful order, so maps are written as sorted `[coord, value]` pairs:
//!
//! ```text
//! "tiles": [["0,0", { "sprite": "grass" }], ["1,0", { "sprite": "dirt" }]]
//! ```
//!
//! Older documents wrote a plain object (`{ "0,0": {...} }`); both forms are
//! read.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::asset::{LoadedImage, ResourceState};
use crate::math::{Vec2, vec2_xy};

// ── Coordinates ──────────────────────────────────────────────────────────

/// A cell coordinate. Orders by `x`, then `y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileCoord {
    pub x: i32,
    pub y: i32,
}

impl TileCoord {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.x, self.y)
    }
}

impl FromStr for TileCoord {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (x, y) = s
            .split_once(',')
            .ok_or_else(|| format!("tile coordinate '{s}' is not of the form 'x,y'"))?;
        let parse = |v: &str| {
            v.trim()
                .parse::<i32>()
                .map_err(|e| format!("tile coordinate '{s}': {e}"))
        };
        Ok(TileCoord::new(parse(x)?, parse(y)?))
    }
}

/// `#[serde(with = "coord_pairs")]` for `BTreeMap<TileCoord, V>` fields.
pub mod coord_pairs {
    use super::*;

    pub fn serialize<S, V>(map: &BTreeMap<TileCoord, V>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        V: Serialize,
    {
        serializer.collect_seq(map.iter().map(|(coord, value)| (coord.to_string(), value)))
    }

    pub fn deserialize<'de, D, V>(deserializer: D) -> Result<BTreeMap<TileCoord, V>, D::Error>
    where
        D: Deserializer<'de>,
        V: Deserialize<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawCoordMap<V> {
            Pairs(Vec<(String, V)>),
            Object(HashMap<String, V>),
        }

        let entries: Vec<(String, V)> = match RawCoordMap::deserialize(deserializer)? {
            RawCoordMap::Pairs(pairs) => pairs,
            RawCoordMap::Object(map) => map.into_iter().collect(),
        };
        entries
            .into_iter()
            .map(|(key, value)| {
                let coord = key.parse::<TileCoord>().map_err(serde::de::Error::custom)?;
                Ok((coord, value))
            })
            .collect()
    }
}

// ── Tilemap ──────────────────────────────────────────────────────────────

/// One painted cell. `sprite` names the tile image; any other fields a tool
/// wrote are carried along untouched.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Tile {
    #[serde(default)]
    pub sprite: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Tile {
    pub fn new(sprite: impl Into<String>) -> Self {
        Self {
            sprite: sprite.into(),
            extra: serde_json::Map::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TilemapLayer {
    pub name: String,
    /// Offset of the layer, in map-size units.
    #[serde(with = "vec2_xy")]
    pub position: Vec2,
    #[serde(with = "coord_pairs")]
    pub tiles: BTreeMap<TileCoord, Tile>,
}

impl TilemapLayer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            position: Vec2::ZERO,
            tiles: BTreeMap::new(),
        }
    }
}

impl Default for TilemapLayer {
    fn default() -> Self {
        Self::new("Layer 0")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Tilemap {
    pub width: u32,
    pub height: u32,
    /// When false, `width`/`height` follow the painted tiles.
    pub manual_size: bool,
    pub active_layer_index: usize,
    pub layers: Vec<TilemapLayer>,
}

impl Default for Tilemap {
    fn default() -> Self {
        Self {
            width: 10,
            height: 10,
            manual_size: false,
            active_layer_index: 0,
            layers: vec![TilemapLayer::default()],
        }
    }
}

impl Tilemap {
    /// Append a layer, make it active and return its index.
    pub fn add_layer(&mut self, name: impl Into<String>) -> usize {
        self.layers.push(TilemapLayer::new(name));
        self.active_layer_index = self.layers.len() - 1;
        self.active_layer_index
    }

    /// Remove the layer at `index`. The last remaining layer is never removed.
    pub fn remove_layer(&mut self, index: usize) -> bool {
        if self.layers.len() <= 1 || index >= self.layers.len() {
            return false;
        }
        self.layers.remove(index);
        if self.active_layer_index >= self.layers.len() {
            self.active_layer_index = self.layers.len() - 1;
        }
        self.recalculate_bounds();
        true
    }

    pub fn active_layer(&self) -> Option<&TilemapLayer> {
        self.layers.get(self.active_layer_index)
    }

    /// Paint `tile` at `(x, y)` on `layer`. Returns false if the layer does
    /// not exist.
    pub fn set_tile(&mut self, layer: usize, x: i32, y: i32, tile: Tile) -> bool {
        let Some(target) = self.layers.get_mut(layer) else {
            return false;
        };
        target.tiles.insert(TileCoord::new(x, y), tile);
        self.recalculate_bounds();
        true
    }

    pub fn tile_at(&self, layer: usize, x: i32, y: i32) -> Option<&Tile> {
        self.layers.get(layer)?.tiles.get(&TileCoord::new(x, y))
    }

    pub fn clear_tile(&mut self, layer: usize, x: i32, y: i32) -> Option<Tile> {
        let removed = self.layers.get_mut(layer)?.tiles.remove(&TileCoord::new(x, y));
        if removed.is_some() {
            self.recalculate_bounds();
        }
        removed
    }

    pub fn tile_count(&self) -> usize {
        self.layers.iter().map(|l| l.tiles.len()).sum()
    }

    /// Grow or shrink `width`/`height` to the extent of the painted tiles.
    /// Does nothing in manual-size mode or when the map is empty. An extent
    /// wider than `u32::MAX` cells saturates.
    pub fn recalculate_bounds(&mut self) {
        if self.manual_size {
            return;
        }
        let mut coords = self.layers.iter().flat_map(|l| l.tiles.keys());
        let Some(first) = coords.next() else {
            return;
        };
        let (mut min, mut max) = (*first, *first);
        for c in coords {
            min = TileCoord::new(min.x.min(c.x), min.y.min(c.y));
            max = TileCoord::new(max.x.max(c.x), max.y.max(c.y));
        }
        self.width = max.x.abs_diff(min.x).saturating_add(1);
        self.height = max.y.abs_diff(min.y).saturating_add(1);
    }
}

// ── TilemapRenderer ──────────────────────────────────────────────────────

/// Summary of a baked tilemap image.
#[derive(Debug, Clone, PartialEq)]
pub struct BakedTilemap {
    pub width: u32,
    pub height: u32,
    pub tile_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TilemapRenderer {
    pub sorting_layer: String,
    pub order_in_layer: i32,
    #[serde(skip)]
    baked: Option<BakedTilemap>,
    #[serde(skip)]
    tile_images: HashMap<String, ResourceState<LoadedImage>>,
    #[serde(skip)]
    dirty: bool,
}

impl Default for TilemapRenderer {
    fn default() -> Self {
        Self {
            sorting_layer: "Default".into(),
            order_in_layer: 0,
            baked: None,
            tile_images: HashMap::new(),
            dirty: true,
        }
    }
}

impl TilemapRenderer {
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Throw away the bake; the next [`rebuild`](Self::rebuild) starts over.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
        self.baked = None;
        self.tile_images.clear();
    }

    pub fn baked(&self) -> Option<&BakedTilemap> {
        self.baked.as_ref()
    }

    pub fn tile_image(&self, sprite: &str) -> Option<&ResourceState<LoadedImage>> {
        self.tile_images.get(sprite)
    }

    /// Bake `tilemap`. Every distinct tile sprite gets an (initially
    /// unloaded) image cache slot.
    pub fn rebuild(&mut self, tilemap: &Tilemap) -> &BakedTilemap {
        for layer in &tilemap.layers {
            for tile in layer.tiles.values() {
                self.tile_images.entry(tile.sprite.clone()).or_default();
            }
        }
        self.dirty = false;
        self.baked.insert(BakedTilemap {
            width: tilemap.width,
            height: tilemap.height,
            tile_count: tilemap.tile_count(),
        })
    }
}

// ── TilemapCollider2D ────────────────────────────────────────────────────

/// A collision rectangle in cell units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileCollider {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TilemapCollider2D {
    /// Layer to build colliders from; negative disables generation.
    pub source_layer_index: i32,
    pub generated_colliders: Vec<TileCollider>,
    /// Occupied cell → index into `generated_colliders`.
    #[serde(with = "coord_pairs")]
    pub mesh_cache: BTreeMap<TileCoord, usize>,
}

impl Default for TilemapCollider2D {
    fn default() -> Self {
        Self {
            source_layer_index: 0,
            generated_colliders: Vec::new(),
            mesh_cache: BTreeMap::new(),
        }
    }
}

impl TilemapCollider2D {
    /// Rebuild colliders from the source layer, merging each horizontal run
    /// of occupied cells into one rectangle. Returns the collider count.
    pub fn generate(&mut self, tilemap: &Tilemap) -> usize {
        self.generated_colliders.clear();
        self.mesh_cache.clear();

        let layer = usize::try_from(self.source_layer_index)
            .ok()
            .and_then(|i| tilemap.layers.get(i));
        let Some(layer) = layer else {
            return 0;
        };

        let mut cells: Vec<TileCoord> = layer.tiles.keys().copied().collect();
        cells.sort_by_key(|c| (c.y, c.x));

        let mut run: Option<(TileCoord, u32)> = None;
        for cell in cells {
            run = match run {
                Some((start, len))
                    if start.y == cell.y && i64::from(start.x) + i64::from(len) == i64::from(cell.x) =>
                {
                    Some((start, len + 1))
                }
                Some(finished) => {
                    self.push_run(finished);
                    Some((cell, 1))
                }
                None => Some((cell, 1)),
            };
        }
        if let Some(finished) = run {
            self.push_run(finished);
        }
        self.generated_colliders.len()
    }

    fn push_run(&mut self, (start, len): (TileCoord, u32)) {
        let index = self.generated_colliders.len();
        self.generated_colliders.push(TileCollider {
            x: start.x,
            y: start.y,
            width: len,
            height: 1,
        });
        for x in (0..len).filter_map(|dx| start.x.checked_add_unsigned(dx)) {
            self.mesh_cache.insert(TileCoord::new(x, start.y), index);
        }
    }

    pub fn collider_at(&self, x: i32, y: i32) -> Option<&TileCollider> {
        let index = *self.mesh_cache.get(&TileCoord::new(x, y))?;
        self.generated_colliders.get(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn painted() -> Tilemap {
        let mut map = Tilemap::default();
        map.set_tile(0, 1, 0, Tile::new("dirt"));
        map.set_tile(0, 0, 0, Tile::new("grass"));
        map.set_tile(0, 2, 0, Tile::new("grass"));
        map.set_tile(0, 0, 2, Tile::new("stone"));
        map
    }

    #[test]
    fn tiles_flatten_to_sorted_pairs() {
        let map = painted();
        let json = serde_json::to_value(&map).unwrap();
        assert_eq!(
            json["layers"][0]["tiles"],
            json!([
                ["0,0", { "sprite": "grass" }],
                ["0,2", { "sprite": "stone" }],
                ["1,0", { "sprite": "dirt" }],
                ["2,0", { "sprite": "grass" }]
            ])
        );
        let back: Tilemap = serde_json::from_value(json).unwrap();
        assert_eq!(back, map);
    }

    #[test]
    fn legacy_object_tiles_are_read() {
        let layer: TilemapLayer = serde_json::from_value(json!({
            "name": "Ground",
            "position": { "x": 0, "y": 0 },
            "tiles": { "3,-1": { "sprite": "water", "solid": true } }
        }))
        .unwrap();
        let tile = &layer.tiles[&TileCoord::new(3, -1)];
        assert_eq!(tile.sprite, "water");
        assert_eq!(tile.extra["solid"], json!(true));
    }

    #[test]
    fn bad_coordinate_is_an_error() {
        let result: Result<TilemapLayer, _> =
            serde_json::from_value(json!({ "tiles": [["a;b", { "sprite": "x" }]] }));
        assert!(result.is_err());
    }

    #[test]
    fn layers_and_bounds() {
        let mut map = painted();
        assert_eq!((map.width, map.height), (3, 3));

        assert_eq!(map.add_layer("Decor"), 1);
        assert!(map.set_tile(1, 5, 5, Tile::new("flower")));
        assert_eq!((map.width, map.height), (6, 6));
        assert!(!map.set_tile(9, 0, 0, Tile::new("nope")));

        assert!(map.remove_layer(1));
        assert_eq!(map.active_layer_index, 0);
        assert_eq!((map.width, map.height), (3, 3));
        // The last layer stays.
        assert!(!map.remove_layer(0));

        assert_eq!(map.clear_tile(0, 0, 2).map(|t| t.sprite), Some("stone".to_string()));
        assert!(map.tile_at(0, 0, 2).is_none());
        assert_eq!(map.height, 1);

        map.manual_size = true;
        map.width = 40;
        map.recalculate_bounds();
        assert_eq!(map.width, 40);
    }

    #[test]
    fn collider_merges_horizontal_runs() {
        let map = painted();
        let mut collider = TilemapCollider2D::default();
        assert_eq!(collider.generate(&map), 2);
        assert_eq!(
            collider.generated_colliders[0],
            TileCollider { x: 0, y: 0, width: 3, height: 1 }
        );
        assert_eq!(collider.collider_at(2, 0), Some(&collider.generated_colliders[0]));
        assert_eq!(collider.collider_at(0, 2).map(|c| c.width), Some(1));
        assert!(collider.collider_at(1, 1).is_none());

        let json = serde_json::to_value(&collider).unwrap();
        assert_eq!(json["meshCache"][0], json!(["0,0", 0]));
        let back: TilemapCollider2D = serde_json::from_value(json).unwrap();
        assert_eq!(back, collider);

        collider.source_layer_index = -1;
        assert_eq!(collider.generate(&map), 0);
        assert!(collider.mesh_cache.is_empty());
    }

    #[test]
    fn extreme_coordinates_stay_in_range() {
        let mut map = Tilemap::default();
        map.set_tile(0, i32::MAX - 1, 0, Tile::new("edge"));
        map.set_tile(0, i32::MAX, 0, Tile::new("edge"));
        map.set_tile(0, i32::MIN, 0, Tile::new("edge"));
        map.set_tile(0, i32::MAX, i32::MIN, Tile::new("corner"));
        assert_eq!((map.width, map.height), (u32::MAX, 2_147_483_649));

        map.recalculate_bounds();
        assert_eq!(map.width, u32::MAX);

        let mut collider = TilemapCollider2D::default();
        assert_eq!(collider.generate(&map), 3);
        let run = collider.collider_at(i32::MAX, 0).unwrap();
        assert_eq!((run.x, run.width), (i32::MAX - 1, 2));
        assert_eq!(collider.collider_at(i32::MAX - 1, 0), Some(run));
        assert_eq!(collider.collider_at(i32::MIN, 0).map(|c| c.width), Some(1));
        assert_eq!(collider.mesh_cache.len(), 4);
    }

    #[test]
    fn renderer_cache_is_derived() {
        let map = painted();
        let mut renderer = TilemapRenderer::default();
        assert!(renderer.is_dirty());

        let baked = renderer.rebuild(&map).clone();
        assert_eq!(baked.tile_count, 4);
        assert!(!renderer.is_dirty());
        assert_eq!(renderer.tile_image("grass"), Some(&ResourceState::Unloaded));

        let json = serde_json::to_value(&renderer).unwrap();
        assert_eq!(json, json!({ "sortingLayer": "Default", "orderInLayer": 0 }));
        let back: TilemapRenderer = serde_json::from_value(json).unwrap();
        assert!(back.is_dirty());
        assert!(back.baked().is_none());
    }
}
