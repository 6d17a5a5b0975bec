//! Plain value types shared by the record codecs.

#[derive(Debug, Default, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Vector2 {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Default, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Vector3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vector3 {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ColorRGB {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

#[derive(Debug, Default, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ColorRGBA {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

/// Project a float channel onto `0..=255`.
///
/// `1.0` maps to 255 and values outside `[0, 1]` are clamped. The stored
/// float is never modified.
pub fn channel_to_u8(channel: f32) -> u8 {
    (channel * 255.999).round().clamp(0.0, 255.0) as u8
}

impl ColorRGB {
    pub fn to_u8(&self) -> [u8; 3] {
        [
            channel_to_u8(self.r),
            channel_to_u8(self.g),
            channel_to_u8(self.b),
        ]
    }
}

impl ColorRGBA {
    pub fn to_u8(&self) -> [u8; 4] {
        [
            channel_to_u8(self.r),
            channel_to_u8(self.g),
            channel_to_u8(self.b),
            channel_to_u8(self.a),
        ]
    }

    /// The color without its alpha channel.
    pub fn rgb(&self) -> ColorRGB {
        ColorRGB {
            r: self.r,
            g: self.g,
            b: self.b,
        }
    }
}
