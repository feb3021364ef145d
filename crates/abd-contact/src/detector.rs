//! Contact enumeration.
//!
//! For every ordered pair of distinct bodies `(a, b)` whose world bounds
//! overlap, every vertex of `a` is mapped into `b`'s local frame and
//! handed to the proximity query. A hit becomes a valid contact when it
//! is inside `b` and no deeper than the threshold.
//!
//! Pairs are visited with the query body `a` outermost, so a full buffer
//! keeps the contacts of lower-indexed query bodies. Vertices are queried
//! in parallel and collected in index order, so the contact list is
//! identical from run to run.

use abd_math::kinematic::{linear_part, transform_points, translation, world_position};
use abd_math::{BlockPattern, DMat3, DVec3, Vec12};
use abd_mesh::{Aabb, TriangleMesh};
use abd_types::constants::EPSILON;
use abd_types::{AbdError, AbdResult};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::contact::Contact;
use crate::query::ProximityQuery;

/// Counters describing one enumeration pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactStats {
    /// Vertex queries issued.
    pub queries: usize,
    /// Query results returned by the proximity service.
    pub hits: usize,
    /// Hits that passed the threshold and sign filters.
    pub detected: usize,
    /// Valid contacts dropped because the buffer was full.
    pub truncated: usize,
    /// Deepest kept penetration.
    pub max_depth: f64,
}

/// Output of one enumeration pass.
#[derive(Debug, Clone, Default)]
pub struct ContactSet {
    /// Valid contacts, at most `max_contacts`.
    pub contacts: Vec<Contact>,
    /// Distinct unordered body pairs with at least one contact.
    pub pairs: Vec<(u32, u32)>,
    /// Hessian block pattern: both diagonal and both cross blocks per pair.
    pub pattern: BlockPattern,
    /// Enumeration counters.
    pub stats: ContactStats,
}

impl ContactSet {
    /// Number of kept contacts.
    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    /// Returns true if no contact was kept.
    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }
}

/// Enumerates vertex-versus-surface contacts between all body pairs.
pub struct ContactDetector {
    query: Box<dyn ProximityQuery>,
    /// Maximum penetration depth of a valid contact.
    pub threshold: f64,
    /// Search radius handed to the proximity query.
    pub query_distance: f64,
    /// Contact buffer capacity.
    pub max_contacts: usize,
}

impl ContactDetector {
    /// Creates a detector around the given proximity service.
    pub fn new(
        query: Box<dyn ProximityQuery>,
        threshold: f64,
        query_distance: f64,
        max_contacts: usize,
    ) -> Self {
        Self {
            query,
            threshold,
            query_distance,
            max_contacts,
        }
    }

    /// Name of the underlying proximity service.
    pub fn query_name(&self) -> &str {
        self.query.name()
    }

    /// Runs enumeration for all bodies at poses `q`.
    pub fn detect(&self, meshes: &[&TriangleMesh], q: &[Vec12]) -> AbdResult<ContactSet> {
        if meshes.len() != q.len() {
            return Err(AbdError::Dimension {
                expected: meshes.len(),
                actual: q.len(),
            });
        }

        let world_bounds: Vec<Aabb> = meshes
            .iter()
            .zip(q)
            .map(|(mesh, qi)| Aabb::from_points(transform_points(qi, &collect_vertices(mesh))))
            .collect();

        let mut stats = ContactStats::default();
        let mut contacts = Vec::new();

        // Inverse linear part and translation of every usable target body.
        let targets: Vec<Option<(DMat3, DVec3)>> = q
            .iter()
            .enumerate()
            .map(|(b, qb)| {
                let f_b = linear_part(qb);
                if f_b.determinant().abs() < EPSILON {
                    tracing::warn!(body = b, "singular linear part, skipping as contact target");
                    return None;
                }
                Some((f_b.inverse(), translation(qb)))
            })
            .collect();

        for a in 0..meshes.len() {
            let mesh_a = meshes[a];
            for b in 0..meshes.len() {
                let Some((f_b_inv, t_b)) = targets[b] else {
                    continue;
                };
                let target = world_bounds[b].expanded(self.query_distance);
                if a == b || !overlaps(&world_bounds[a], &target) {
                    continue;
                }
                stats.queries += mesh_a.vertex_count();

                let results: Vec<Option<Contact>> = (0..mesh_a.vertex_count())
                    .into_par_iter()
                    .filter_map(|v| {
                        let ref_a = mesh_a.position(v);
                        let world = world_position(&q[a], ref_a);
                        let local = f_b_inv * (world - t_b);
                        let hit = self.query.query(meshes[b], local, self.query_distance)?;

                        let normal = (f_b_inv.transpose() * hit.face_normal).normalize_or_zero();
                        let closest_world = world_position(&q[b], hit.closest_point);
                        let depth = world.distance(closest_world);
                        let valid = hit.is_inside() && depth <= self.threshold && normal != DVec3::ZERO;

                        Some(valid.then_some(Contact {
                            body_a: a as u32,
                            body_b: b as u32,
                            vertex: v as u32,
                            ref_a,
                            ref_b: hit.closest_point,
                            normal,
                            depth,
                            valid,
                        }))
                    })
                    .collect();

                stats.hits += results.len();
                contacts.extend(results.into_iter().flatten());
            }
        }

        stats.detected = contacts.len();
        if contacts.len() > self.max_contacts {
            stats.truncated = contacts.len() - self.max_contacts;
            tracing::warn!(
                detected = contacts.len(),
                capacity = self.max_contacts,
                "contact buffer full, dropping {} contacts",
                stats.truncated
            );
            contacts.truncate(self.max_contacts);
        }
        stats.max_depth = contacts.iter().map(|c| c.depth).fold(0.0, f64::max);

        let mut pattern = BlockPattern::new();
        let mut pairs = Vec::new();
        for c in &contacts {
            let (lo, hi) = c.pair();
            if !pattern.contains(lo as usize, hi as usize) {
                pairs.push((lo, hi));
            }
            pattern.insert_pair(lo as usize, hi as usize);
        }
        pairs.sort_unstable();

        tracing::debug!(
            contacts = contacts.len(),
            pairs = pairs.len(),
            max_depth = stats.max_depth,
            "contact detection"
        );

        Ok(ContactSet {
            contacts,
            pairs,
            pattern,
            stats,
        })
    }
}

fn collect_vertices(mesh: &TriangleMesh) -> Vec<DVec3> {
    mesh.positions().collect()
}

fn overlaps(a: &Aabb, b: &Aabb) -> bool {
    a.min.cmple(b.max).all() && b.min.cmple(a.max).all()
}
