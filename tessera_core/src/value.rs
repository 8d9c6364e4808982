// Copyright 2026 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Unit-tagged geometry values.
//!
//! A [`GeometryValue`] is one declared channel of a unit: a magnitude plus a
//! [`ValueUnit`]. Values on the four geometric channels (`width`, `height`,
//! `x`, `y`) that are not in pixels are percentages of the parent and get
//! resolved to pixels by the scene tree; the resolved pixel magnitude is
//! memoized on the value until the next forced resolution.
//!
//! Declarations arrive either as inline strings (`"50%"`, `"-12.5px"`,
//! `"30deg"`, `"2"`) or as an explicit magnitude/unit pair, see
//! [`ValueSpec`]. Anything that fails to parse falls back to the channel
//! default.

use core::fmt;
use core::str::FromStr;

/// One resolvable geometry property of a unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Channel {
    /// Horizontal size.
    Width,
    /// Vertical size.
    Height,
    /// Horizontal position of the top-left corner.
    X,
    /// Vertical position of the top-left corner.
    Y,
    /// Stacking order.
    #[cfg_attr(feature = "serde", serde(alias = "z_index"))]
    ZOrder,
    /// Transparency, 0 (opaque) to 100 (invisible).
    Opacity,
    /// Clockwise rotation in degrees.
    Rotation,
}

/// Channel families that share a resolution rule.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChannelGroup {
    /// `width` and `height`.
    Size,
    /// `x` and `y`.
    Position,
    /// Channel-local values with no parent dependency.
    Local,
}

impl Channel {
    /// All channels, sizes first so positions always see fresh parent sizes.
    pub const ALL: [Self; 7] = [
        Self::Width,
        Self::Height,
        Self::X,
        Self::Y,
        Self::ZOrder,
        Self::Opacity,
        Self::Rotation,
    ];

    /// Dense index into per-channel arrays.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Returns which resolution rule applies to this channel.
    #[must_use]
    pub const fn group(self) -> ChannelGroup {
        match self {
            Self::Width | Self::Height => ChannelGroup::Size,
            Self::X | Self::Y => ChannelGroup::Position,
            Self::ZOrder | Self::Opacity | Self::Rotation => ChannelGroup::Local,
        }
    }

    /// For a position channel, the parent size channel along the same axis.
    #[must_use]
    pub const fn axis_size(self) -> Option<Self> {
        match self {
            Self::X => Some(Self::Width),
            Self::Y => Some(Self::Height),
            _ => None,
        }
    }

    /// Channels of a child that must be re-applied when this channel of its
    /// parent changes.
    #[must_use]
    pub const fn dependents(self) -> &'static [Self] {
        match self {
            Self::Width => &[Self::Width, Self::X],
            Self::Height => &[Self::Height, Self::Y],
            Self::X => &[Self::X],
            Self::Y => &[Self::Y],
            Self::ZOrder | Self::Opacity | Self::Rotation => &[],
        }
    }

    /// The canonical lower-case name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Width => "width",
            Self::Height => "height",
            Self::X => "x",
            Self::Y => "y",
            Self::ZOrder => "z_order",
            Self::Opacity => "opacity",
            Self::Rotation => "rotation",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Channel {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, ()> {
        match s {
            "width" => Ok(Self::Width),
            "height" => Ok(Self::Height),
            "x" => Ok(Self::X),
            "y" => Ok(Self::Y),
            "z_order" | "z_index" => Ok(Self::ZOrder),
            "opacity" => Ok(Self::Opacity),
            "rotation" => Ok(Self::Rotation),
            _ => Err(()),
        }
    }
}

/// The unit a magnitude is expressed in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ValueUnit {
    /// Absolute pixels (`px`).
    Pixel,
    /// Percent of the parent (`%`).
    Percent,
    /// Degrees (`deg`).
    Degree,
    /// No unit suffix.
    None,
}

impl ValueUnit {
    /// Parses a unit suffix. Returns `None` for unknown suffixes.
    #[must_use]
    pub fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix {
            "px" => Some(Self::Pixel),
            "%" => Some(Self::Percent),
            "deg" => Some(Self::Degree),
            "" => Some(Self::None),
            _ => None,
        }
    }

    /// The suffix written after a magnitude.
    #[must_use]
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::Pixel => "px",
            Self::Percent => "%",
            Self::Degree => "deg",
            Self::None => "",
        }
    }
}

/// A declaration for one channel, as supplied at construction time.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum ValueSpec {
    /// An inline string such as `"50%"` or `"12px"`.
    Inline(String),
    /// An explicit magnitude and unit.
    Declared {
        /// Numeric magnitude.
        magnitude: f64,
        /// Unit the magnitude is expressed in.
        unit: ValueUnit,
    },
}

impl From<&str> for ValueSpec {
    fn from(s: &str) -> Self {
        Self::Inline(s.into())
    }
}

impl From<String> for ValueSpec {
    fn from(s: String) -> Self {
        Self::Inline(s)
    }
}

impl From<(f64, ValueUnit)> for ValueSpec {
    fn from((magnitude, unit): (f64, ValueUnit)) -> Self {
        Self::Declared { magnitude, unit }
    }
}

/// A unit-tagged magnitude for one channel, with its memoized pixel
/// resolution.
#[derive(Clone, Debug, PartialEq)]
pub struct GeometryValue {
    channel: Channel,
    /// Declared magnitude; animations add to this directly.
    pub magnitude: f64,
    unit: ValueUnit,
    cache: Option<f64>,
}

impl GeometryValue {
    /// Creates a value with an empty resolution cache.
    #[must_use]
    pub const fn new(channel: Channel, magnitude: f64, unit: ValueUnit) -> Self {
        Self {
            channel,
            magnitude,
            unit,
            cache: None,
        }
    }

    /// The value a unit gets for `channel` when nothing (or nothing valid) is
    /// declared.
    #[must_use]
    pub const fn default_for(channel: Channel) -> Self {
        match channel {
            Channel::Width | Channel::Height => Self::new(channel, 100.0, ValueUnit::Percent),
            Channel::X | Channel::Y => Self::new(channel, 0.0, ValueUnit::Pixel),
            Channel::ZOrder => Self::new(channel, 1.0, ValueUnit::None),
            Channel::Opacity => Self::new(channel, 0.0, ValueUnit::Percent),
            Channel::Rotation => Self::new(channel, 0.0, ValueUnit::Degree),
        }
    }

    /// Parses an inline declaration like `"+12.5px"`.
    ///
    /// Leading and trailing whitespace is ignored. Returns `None` when no
    /// number is present or the suffix is not a known unit.
    #[must_use]
    pub fn parse(channel: Channel, input: &str) -> Option<Self> {
        let s = input.trim();
        let bytes = s.as_bytes();
        let mut end = 0;
        if matches!(bytes.first(), Some(b'+' | b'-')) {
            end = 1;
        }
        let int_start = end;
        while bytes.get(end).is_some_and(u8::is_ascii_digit) {
            end += 1;
        }
        if end == int_start {
            return None;
        }
        if bytes.get(end) == Some(&b'.') {
            end += 1;
            while bytes.get(end).is_some_and(u8::is_ascii_digit) {
                end += 1;
            }
        }
        let number = s[..end].trim_end_matches('.');
        let magnitude: f64 = number.parse().ok()?;
        let unit = ValueUnit::from_suffix(s[end..].trim())?;
        Some(Self::new(channel, magnitude, unit))
    }

    /// Builds a value from a construction-time declaration, falling back to
    /// [`default_for`](Self::default_for) when the declaration is malformed.
    #[must_use]
    pub fn from_spec(channel: Channel, spec: &ValueSpec) -> Self {
        let parsed = match spec {
            ValueSpec::Inline(s) => Self::parse(channel, s),
            ValueSpec::Declared { magnitude, unit } => {
                magnitude.is_finite().then(|| Self::new(channel, *magnitude, *unit))
            }
        };
        parsed.unwrap_or_else(|| {
            log::debug!("malformed {channel} declaration {spec:?}; using default");
            Self::default_for(channel)
        })
    }

    /// The channel this value belongs to.
    #[inline]
    #[must_use]
    pub const fn channel(&self) -> Channel {
        self.channel
    }

    /// The declared unit.
    #[inline]
    #[must_use]
    pub const fn unit(&self) -> ValueUnit {
        self.unit
    }

    /// Whether the magnitude is already absolute pixels.
    #[inline]
    #[must_use]
    pub const fn is_pixel(&self) -> bool {
        matches!(self.unit, ValueUnit::Pixel)
    }

    /// Whether the magnitude is a percentage of the parent.
    #[inline]
    #[must_use]
    pub const fn is_percent(&self) -> bool {
        matches!(self.unit, ValueUnit::Percent)
    }

    /// The memoized pixel resolution, if any.
    #[inline]
    #[must_use]
    pub const fn cached(&self) -> Option<f64> {
        self.cache
    }

    pub(crate) fn store(&mut self, px: f64) {
        self.cache = Some(px);
    }

    /// Drops the memoized resolution.
    pub fn invalidate(&mut self) {
        self.cache = None;
    }
}

impl fmt::Display for GeometryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.magnitude, self.unit.suffix())
    }
}

/// The full set of channel values of one unit, indexed by [`Channel`].
#[derive(Clone, Debug, PartialEq)]
pub struct ChannelSet {
    values: [GeometryValue; 7],
}

impl Default for ChannelSet {
    fn default() -> Self {
        Self {
            values: Channel::ALL.map(GeometryValue::default_for),
        }
    }
}

impl ChannelSet {
    /// Returns the value for `channel`.
    #[inline]
    #[must_use]
    pub fn get(&self, channel: Channel) -> &GeometryValue {
        &self.values[channel.index()]
    }

    /// Returns the value for `channel` mutably.
    #[inline]
    pub fn get_mut(&mut self, channel: Channel) -> &mut GeometryValue {
        &mut self.values[channel.index()]
    }

    /// Replaces the value for its channel.
    pub fn set(&mut self, value: GeometryValue) {
        let idx = value.channel.index();
        self.values[idx] = value;
    }

    /// Iterates over all seven values in [`Channel::ALL`] order.
    pub fn iter(&self) -> impl Iterator<Item = &GeometryValue> {
        self.values.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_inline_declarations() {
        let v = GeometryValue::parse(Channel::Width, "50%").unwrap();
        assert_eq!(v.magnitude, 50.0);
        assert_eq!(v.unit(), ValueUnit::Percent);

        let v = GeometryValue::parse(Channel::X, " -12.5px ").unwrap();
        assert_eq!(v.magnitude, -12.5);
        assert!(v.is_pixel());

        let v = GeometryValue::parse(Channel::Rotation, "+30deg").unwrap();
        assert_eq!(v.magnitude, 30.0);
        assert_eq!(v.unit(), ValueUnit::Degree);

        let v = GeometryValue::parse(Channel::ZOrder, "3").unwrap();
        assert_eq!(v.unit(), ValueUnit::None);

        let v = GeometryValue::parse(Channel::Y, "7.px").unwrap();
        assert_eq!(v.magnitude, 7.0);
    }

    #[test]
    fn rejects_garbage() {
        assert!(GeometryValue::parse(Channel::Width, "").is_none());
        assert!(GeometryValue::parse(Channel::Width, "abc").is_none());
        assert!(GeometryValue::parse(Channel::Width, "-").is_none());
        assert!(GeometryValue::parse(Channel::Width, "12furlongs").is_none());
    }

    #[test]
    fn malformed_spec_falls_back_to_default() {
        let v = GeometryValue::from_spec(Channel::Width, &"wide".into());
        assert_eq!(v, GeometryValue::default_for(Channel::Width));

        let v = GeometryValue::from_spec(Channel::X, &(f64::NAN, ValueUnit::Pixel).into());
        assert_eq!(v, GeometryValue::default_for(Channel::X));

        let v = GeometryValue::from_spec(Channel::X, &(4.0, ValueUnit::Percent).into());
        assert_eq!(v.magnitude, 4.0);
        assert!(v.is_percent());
    }

    #[test]
    fn defaults_match_unit_construction_rules() {
        let set = ChannelSet::default();
        assert_eq!(set.get(Channel::Width).magnitude, 100.0);
        assert!(set.get(Channel::Height).is_percent());
        assert!(set.get(Channel::X).is_pixel());
        assert_eq!(set.get(Channel::ZOrder).magnitude, 1.0);
        assert_eq!(set.get(Channel::Opacity).magnitude, 0.0);
        assert_eq!(set.get(Channel::Rotation).unit(), ValueUnit::Degree);
    }

    #[test]
    fn channel_names_round_trip_and_accept_alias() {
        for channel in Channel::ALL {
            assert_eq!(channel.name().parse::<Channel>(), Ok(channel));
        }
        assert_eq!("z_index".parse::<Channel>(), Ok(Channel::ZOrder));
        assert!("depth".parse::<Channel>().is_err());
    }

    #[test]
    fn size_changes_reach_dependent_positions() {
        assert_eq!(Channel::Width.dependents(), &[Channel::Width, Channel::X]);
        assert_eq!(Channel::Y.dependents(), &[Channel::Y]);
        assert!(Channel::Opacity.dependents().is_empty());
        assert_eq!(Channel::X.axis_size(), Some(Channel::Width));
    }

    #[test]
    fn cache_is_dropped_on_invalidate() {
        let mut v = GeometryValue::default_for(Channel::Width);
        v.store(320.0);
        assert_eq!(v.cached(), Some(320.0));
        v.invalidate();
        assert_eq!(v.cached(), None);
    }
}
