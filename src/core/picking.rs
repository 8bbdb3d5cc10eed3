use glam::{Mat4, Vec2, Vec3, Vec4};

/// Axis-aligned bounding box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub const EMPTY: Aabb = Aabb {
        min: Vec3::splat(f32::INFINITY),
        max: Vec3::splat(f32::NEG_INFINITY),
    };

    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Self {
        points.into_iter().fold(Self::EMPTY, |b, p| b.grow(p))
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    #[inline]
    pub fn grow(self, p: Vec3) -> Self {
        Self {
            min: self.min.min(p),
            max: self.max.max(p),
        }
    }

    pub fn union(self, other: Aabb) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Bounds of this box after transforming its eight corners.
    pub fn transformed(&self, m: &Mat4) -> Self {
        if self.is_empty() {
            return *self;
        }
        let mut out = Self::EMPTY;
        for i in 0..8 {
            let corner = Vec3::new(
                if i & 1 == 0 { self.min.x } else { self.max.x },
                if i & 2 == 0 { self.min.y } else { self.max.y },
                if i & 4 == 0 { self.min.z } else { self.max.z },
            );
            out = out.grow(m.transform_point3(corner));
        }
        out
    }
}

/// Slab test. Returns the entry distance along `ray_dir`, or the exit
/// distance when the origin is inside the box.
pub fn ray_aabb(ray_origin: Vec3, ray_dir: Vec3, bounds: &Aabb) -> Option<f32> {
    if bounds.is_empty() {
        return None;
    }
    let inv = ray_dir.recip();
    let t1 = (bounds.min - ray_origin) * inv;
    let t2 = (bounds.max - ray_origin) * inv;
    let t_near = t1.min(t2).max_element();
    let t_far = t1.max(t2).min_element();
    if t_far < 0.0 || t_near > t_far {
        return None;
    }
    Some(if t_near >= 0.0 { t_near } else { t_far })
}

/// World-space ray through a pixel of a `width`×`height` viewport.
pub fn screen_to_world_ray(view_proj: Mat4, width: f32, height: f32, px: Vec2) -> (Vec3, Vec3) {
    let ndc_x = (2.0 * px.x / width.max(1.0)) - 1.0;
    let ndc_y = 1.0 - (2.0 * px.y / height.max(1.0));
    let inv = view_proj.inverse();
    let p_near = inv * Vec4::new(ndc_x, ndc_y, 0.0, 1.0);
    let p_far = inv * Vec4::new(ndc_x, ndc_y, 1.0, 1.0);
    let p0 = p_near.truncate() / p_near.w;
    let p1 = p_far.truncate() / p_far.w;
    (p0, (p1 - p0).normalize())
}

/// Index and distance of the nearest hit among `targets`.
pub fn nearest_hit<'a, I>(ray_origin: Vec3, ray_dir: Vec3, targets: I) -> Option<(usize, f32)>
where
    I: IntoIterator<Item = (usize, &'a Aabb)>,
{
    let mut best = None::<(usize, f32)>;
    for (i, bounds) in targets {
        if let Some(t) = ray_aabb(ray_origin, ray_dir, bounds) {
            match best {
                Some((_, bt)) if t >= bt => {}
                _ => best = Some((i, t)),
            }
        }
    }
    best
}
