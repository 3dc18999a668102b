/*!
    Reusable sink-compatible pixel buffers.

    Each export job owns one pool sized to the sink's presentation
    dimensions. Buffers are drawn per frame slot, rendered into, handed to
    the sink by reference, and recycled when dropped.
*/

use std::sync::Arc;

use image::RgbaImage;
use parking_lot::Mutex;

/**
    A pool of fixed-size RGBA buffers.
*/
#[derive(Clone)]
pub struct BufferPool {
    width: u32,
    height: u32,
    free: Arc<Mutex<Vec<RgbaImage>>>,
}

impl BufferPool {
    /**
        Create a pool vending `width` x `height` buffers.
    */
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            free: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /**
        Draw a cleared buffer from the pool, allocating if none are free.
    */
    pub fn draw(&self) -> PooledBuffer {
        let image = match self.free.lock().pop() {
            Some(mut image) => {
                image.fill(0);
                image
            }
            None => RgbaImage::new(self.width, self.height),
        };
        PooledBuffer {
            image: Some(image),
            free: Arc::clone(&self.free),
        }
    }

    /**
        Number of idle buffers currently held by the pool.
    */
    pub fn idle(&self) -> usize {
        self.free.lock().len()
    }
}

/**
    A buffer on loan from a `BufferPool`; returned on drop.
*/
pub struct PooledBuffer {
    image: Option<RgbaImage>,
    free: Arc<Mutex<Vec<RgbaImage>>>,
}

impl PooledBuffer {
    pub fn image(&self) -> &RgbaImage {
        self.image.as_ref().expect("buffer taken")
    }

    pub fn image_mut(&mut self) -> &mut RgbaImage {
        self.image.as_mut().expect("buffer taken")
    }
}

impl Drop for PooledBuffer {
    fn drop(&mut self) {
        if let Some(image) = self.image.take() {
            self.free.lock().push(image);
        }
    }
}

static_assertions::assert_impl_all!(BufferPool: Send, Sync);
static_assertions::assert_impl_all!(PooledBuffer: Send);
