//! Render Surface - arena of vertex buffers plus the frame's draw list
//!
//! Visualizers allocate their buffers in `init`, rewrite them in `render`
//! and hand them back in `destroy`. The manager clears the whole arena on
//! every switch, so nothing allocated by a previous instance survives.

use bytemuck::{Pod, Zeroable};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Identifier of a buffer in the surface arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferId(u64);

impl BufferId {
    /// Raw id value
    pub fn raw(self) -> u64 {
        self.0
    }
}

/// How the vertices of a buffer are interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    /// Point sprites (`size` = diameter)
    Points,
    /// Outline circles (`size` = radius)
    Rings,
    /// Vertical bars (`size` = height)
    Bars,
}

/// GPU-ready vertex
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    /// World position
    pub position: [f32; 3],
    /// Primitive-specific size
    pub size: f32,
    /// Linear RGBA color
    pub color: [f32; 4],
}

impl Vertex {
    /// Create a vertex
    pub fn new(position: [f32; 3], size: f32, color: [f32; 4]) -> Self {
        Self {
            position,
            size,
            color,
        }
    }
}

/// A single draw issued during the current frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawCall {
    /// Buffer drawn
    pub buffer: BufferId,
    /// Primitive type of the buffer
    pub primitive: Primitive,
    /// Number of vertices drawn
    pub count: usize,
}

#[derive(Debug)]
struct Buffer {
    label: String,
    primitive: Primitive,
    vertices: Vec<Vertex>,
}

/// Arena-backed rendering surface
#[derive(Debug, Default)]
pub struct Surface {
    buffers: BTreeMap<BufferId, Buffer>,
    draw_calls: Vec<DrawCall>,
    next_id: u64,
    /// Viewport size in pixels
    width: u32,
    height: u32,
}

impl Surface {
    /// Create a surface with the given viewport size
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Default::default()
        }
    }

    /// Viewport size in pixels
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Width over height, 1.0 for a degenerate viewport
    pub fn aspect(&self) -> f32 {
        if self.width == 0 || self.height == 0 {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }

    /// Update the viewport size
    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }

    /// Allocate a vertex buffer with room for `capacity` vertices
    pub fn allocate(&mut self, label: &str, primitive: Primitive, capacity: usize) -> BufferId {
        let id = BufferId(self.next_id);
        self.next_id += 1;
        self.buffers.insert(
            id,
            Buffer {
                label: label.to_string(),
                primitive,
                vertices: Vec::with_capacity(capacity),
            },
        );
        debug!("Surface: allocated '{}' ({:?}, {} vertices)", label, id, capacity);
        id
    }

    /// Replace the contents of a buffer. Returns false for released buffers.
    pub fn write(&mut self, id: BufferId, vertices: &[Vertex]) -> bool {
        match self.buffers.get_mut(&id) {
            Some(buffer) => {
                buffer.vertices.clear();
                buffer.vertices.extend_from_slice(vertices);
                true
            }
            None => {
                warn!("Surface: write to released buffer {:?}", id);
                false
            }
        }
    }

    /// Record a draw of the first `count` vertices of a buffer
    pub fn draw(&mut self, id: BufferId, count: usize) {
        let Some(buffer) = self.buffers.get(&id) else {
            warn!("Surface: draw of released buffer {:?}", id);
            return;
        };
        self.draw_calls.push(DrawCall {
            buffer: id,
            primitive: buffer.primitive,
            count: count.min(buffer.vertices.len()),
        });
    }

    /// Release a buffer. Releasing twice is harmless.
    pub fn release(&mut self, id: BufferId) {
        if let Some(buffer) = self.buffers.remove(&id) {
            debug!("Surface: released '{}'", buffer.label);
        }
        self.draw_calls.retain(|call| call.buffer != id);
    }

    /// Release everything and forget the frame's draws
    pub fn clear(&mut self) {
        if !self.buffers.is_empty() {
            debug!("Surface: cleared {} buffers", self.buffers.len());
        }
        self.buffers.clear();
        self.draw_calls.clear();
    }

    /// Start a new frame (drops the previous draw list)
    pub fn begin_frame(&mut self) {
        self.draw_calls.clear();
    }

    /// Number of allocated buffers
    pub fn live_buffers(&self) -> usize {
        self.buffers.len()
    }

    /// Whether a buffer is still allocated
    pub fn contains(&self, id: BufferId) -> bool {
        self.buffers.contains_key(&id)
    }

    /// Draws recorded since the last `begin_frame`
    pub fn draw_calls(&self) -> &[DrawCall] {
        &self.draw_calls
    }

    /// Vertices of a buffer
    pub fn vertices(&self, id: BufferId) -> Option<&[Vertex]> {
        self.buffers.get(&id).map(|b| b.vertices.as_slice())
    }

    /// Label of a buffer
    pub fn label(&self, id: BufferId) -> Option<&str> {
        self.buffers.get(&id).map(|b| b.label.as_str())
    }

    /// Raw bytes of a buffer, ready for upload
    pub fn as_bytes(&self, id: BufferId) -> Option<&[u8]> {
        self.vertices(id).map(bytemuck::cast_slice)
    }
}
