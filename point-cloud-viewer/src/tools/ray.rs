use bevy::prelude::*;

/// Distance along `ray` to a unit cube mapped by `xf`, if it is hit.
///
/// The returned parameter is in world units when `ray.direction` is normalised.
pub fn ray_hits_obb(ray: Ray3d, xf: &Transform) -> Option<f32> {
    let inv = xf.compute_matrix().inverse();
    let o_local = inv.transform_point3(ray.origin);
    let d_local = inv.transform_vector3(*ray.direction);
    let he = Vec3::splat(0.5);
    ray_aabb_hit_t(o_local, d_local, -he, he)
}

// Slab-method ray–AABB intersection, returns Some(t) or None.
// An axis the ray runs parallel to only constrains the origin; no 0 * inf products.
pub fn ray_aabb_hit_t(ray_origin: Vec3, ray_direction: Vec3, min: Vec3, max: Vec3) -> Option<f32> {
    let (mut tmin, mut tmax) = (f32::NEG_INFINITY, f32::INFINITY);

    for axis in 0..3 {
        let (origin, direction) = (ray_origin[axis], ray_direction[axis]);
        if direction == 0.0 {
            if origin < min[axis] || origin > max[axis] {
                return None;
            }
            continue;
        }

        let inv = 1.0 / direction;
        let (mut near, mut far) = ((min[axis] - origin) * inv, (max[axis] - origin) * inv);
        if near > far {
            std::mem::swap(&mut near, &mut far);
        }
        tmin = tmin.max(near);
        tmax = tmax.min(far);
        if tmin > tmax {
            return None;
        }
    }

    if tmax < 0.0 {
        return None;
    }
    Some(if tmin >= 0.0 { tmin } else { tmax })
}
