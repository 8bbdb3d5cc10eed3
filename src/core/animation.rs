use super::scene::{SceneGraph, Transform};
use fnv::FnvHashMap;
use glam::{Quat, Vec3};
use smallvec::SmallVec;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Interpolation {
    Step,
    Linear,
    CubicSpline,
}

/// Values that can be blended between keyframes.
pub trait Keyframe: Copy {
    fn interpolate_linear(a: Self, b: Self, t: f32) -> Self;
    fn interpolate_cubic(v0: Self, out0: Self, in1: Self, v1: Self, t: f32, dt: f32) -> Self;
}

#[inline]
fn hermite(t: f32) -> (f32, f32, f32, f32) {
    let t2 = t * t;
    let t3 = t2 * t;
    (
        2.0 * t3 - 3.0 * t2 + 1.0,
        t3 - 2.0 * t2 + t,
        -2.0 * t3 + 3.0 * t2,
        t3 - t2,
    )
}

impl Keyframe for Vec3 {
    fn interpolate_linear(a: Self, b: Self, t: f32) -> Self {
        a.lerp(b, t)
    }

    fn interpolate_cubic(v0: Self, out0: Self, in1: Self, v1: Self, t: f32, dt: f32) -> Self {
        let (h00, h10, h01, h11) = hermite(t);
        v0 * h00 + out0 * (h10 * dt) + v1 * h01 + in1 * (h11 * dt)
    }
}

impl Keyframe for Quat {
    fn interpolate_linear(a: Self, b: Self, t: f32) -> Self {
        a.slerp(b, t)
    }

    fn interpolate_cubic(v0: Self, out0: Self, in1: Self, v1: Self, t: f32, dt: f32) -> Self {
        let (h00, h10, h01, h11) = hermite(t);
        let q = v0 * h00 + out0 * (h10 * dt) + v1 * h01 + in1 * (h11 * dt);
        q.normalize()
    }
}

/// Keyframes for one property. For cubic splines `values` holds
/// `[in_tangent, value, out_tangent]` per key.
#[derive(Clone, Debug)]
pub struct Keyframes<T: Keyframe> {
    pub times: Vec<f32>,
    pub values: Vec<T>,
    pub interpolation: Interpolation,
}

impl<T: Keyframe> Keyframes<T> {
    pub fn new(times: Vec<f32>, values: Vec<T>, interpolation: Interpolation) -> Self {
        Self {
            times,
            values,
            interpolation,
        }
    }

    #[inline]
    fn value_at(&self, index: usize) -> T {
        match self.interpolation {
            Interpolation::CubicSpline => self.values[index * 3 + 1],
            _ => self.values[index],
        }
    }

    pub fn is_valid(&self) -> bool {
        let per_key = match self.interpolation {
            Interpolation::CubicSpline => 3,
            _ => 1,
        };
        !self.times.is_empty() && self.values.len() == self.times.len() * per_key
    }

    pub fn duration(&self) -> f32 {
        self.times.last().copied().unwrap_or(0.0)
    }

    /// Sample at `time`, holding the first/last key outside the keyed range.
    pub fn sample(&self, time: f32) -> T {
        let len = self.times.len();
        let next = self.times.partition_point(|&t| t <= time);
        if next == 0 {
            return self.value_at(0);
        }
        if next >= len {
            return self.value_at(len - 1);
        }
        let i = next - 1;
        let t0 = self.times[i];
        let t1 = self.times[next];
        let dt = t1 - t0;
        let u = if dt > 1e-6 {
            ((time - t0) / dt).clamp(0.0, 1.0)
        } else {
            0.0
        };
        match self.interpolation {
            Interpolation::Step => self.value_at(i),
            Interpolation::Linear => T::interpolate_linear(self.value_at(i), self.value_at(next), u),
            Interpolation::CubicSpline => T::interpolate_cubic(
                self.values[i * 3 + 1],
                self.values[i * 3 + 2],
                self.values[next * 3],
                self.values[next * 3 + 1],
                u,
                dt,
            ),
        }
    }
}

#[derive(Clone, Debug)]
pub enum Channel {
    Translation(Keyframes<Vec3>),
    Rotation(Keyframes<Quat>),
    Scale(Keyframes<Vec3>),
}

/// One baked track driving a single property of a single node.
#[derive(Clone, Debug)]
pub struct Track {
    pub node: usize,
    pub channel: Channel,
}

impl Track {
    pub fn duration(&self) -> f32 {
        match &self.channel {
            Channel::Translation(k) | Channel::Scale(k) => k.duration(),
            Channel::Rotation(k) => k.duration(),
        }
    }

    pub fn property(&self) -> &'static str {
        match self.channel {
            Channel::Translation(_) => "translation",
            Channel::Rotation(_) => "rotation",
            Channel::Scale(_) => "scale",
        }
    }

    pub fn apply(&self, time: f32, transform: &mut Transform) {
        match &self.channel {
            Channel::Translation(k) => transform.translation = k.sample(time),
            Channel::Rotation(k) => transform.rotation = k.sample(time),
            Channel::Scale(k) => transform.scale = k.sample(time),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Clip {
    pub name: String,
    pub tracks: Vec<Track>,
}

impl Clip {
    pub fn duration(&self) -> f32 {
        self.tracks.iter().map(Track::duration).fold(0.0, f32::max)
    }
}

/// Plays every track that targets one node.
#[derive(Clone, Debug)]
pub struct Mixer {
    pub node: usize,
    tracks: SmallVec<[Track; 3]>,
    time: f32,
}

impl Mixer {
    pub fn new(node: usize) -> Self {
        Self {
            node,
            tracks: SmallVec::new(),
            time: 0.0,
        }
    }

    pub fn add_track(&mut self, track: Track) {
        self.tracks.push(track);
    }

    #[inline]
    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    /// Jump straight to `time`.
    pub fn set_time(&mut self, time: f32) {
        self.time = time.max(0.0);
    }

    pub fn apply(&self, graph: &mut SceneGraph) {
        if let Some(node) = graph.get_mut(self.node) {
            for track in &self.tracks {
                track.apply(self.time, &mut node.local);
            }
        }
    }
}

/// All mixers of the loaded asset, one per animated node, sharing a clock.
#[derive(Clone, Debug, Default)]
pub struct AnimationSet {
    mixers: Vec<Mixer>,
}

impl AnimationSet {
    /// Group the tracks of every clip by target node.
    pub fn from_clips(clips: &[Clip]) -> Self {
        let mut by_node: FnvHashMap<usize, usize> = FnvHashMap::default();
        let mut mixers: Vec<Mixer> = Vec::new();
        for clip in clips {
            for track in &clip.tracks {
                let slot = *by_node.entry(track.node).or_insert_with(|| {
                    mixers.push(Mixer::new(track.node));
                    mixers.len() - 1
                });
                mixers[slot].add_track(track.clone());
            }
        }
        Self { mixers }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.mixers.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.mixers.is_empty()
    }

    pub fn mixers(&self) -> &[Mixer] {
        &self.mixers
    }

    /// Shared playhead; zero when nothing is animated.
    pub fn time(&self) -> f32 {
        self.mixers.first().map(Mixer::time).unwrap_or(0.0)
    }

    pub fn scrub(&mut self, time: f32) {
        for m in &mut self.mixers {
            m.set_time(time);
        }
    }

    pub fn apply(&self, graph: &mut SceneGraph) {
        for m in &self.mixers {
            m.apply(graph);
        }
    }
}
