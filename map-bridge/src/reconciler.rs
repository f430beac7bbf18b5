//! Marker reconciliation inside the embedded view
//!
//! Every render is a full replace: all drawn markers are removed, even those
//! whose record and coordinates did not change, and one marker is drawn per
//! plottable record of the incoming collection. Draw identity is never
//! tracked across renders. The rendered set is disposable and never read
//! back as a source of truth.

use shared_types::{LatLng, ListingRecord};

/// Fraction of the marker box's span added on every side when framing.
pub const FIT_PADDING: f64 = 0.25;

/// Zoom used by `centerMap`.
pub const CENTER_ZOOM: u8 = 15;

#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub record_id: String,
    pub position: LatLng,
    pub label: String,
}

impl Marker {
    fn for_record(record: &ListingRecord) -> Option<Self> {
        let position = record.position()?;
        Some(Self {
            record_id: record.id.clone(),
            position,
            label: format!("{}\nPrice: ₹{}", record.name, record.price),
        })
    }
}

/// Axis-aligned lat/lng box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl Bounds {
    /// Smallest box covering every point; `None` for no points.
    pub fn around<'a>(points: impl IntoIterator<Item = &'a LatLng>) -> Option<Self> {
        points.into_iter().fold(None, |acc, p| {
            Some(match acc {
                None => Bounds {
                    south: p.lat,
                    west: p.lng,
                    north: p.lat,
                    east: p.lng,
                },
                Some(b) => Bounds {
                    south: b.south.min(p.lat),
                    west: b.west.min(p.lng),
                    north: b.north.max(p.lat),
                    east: b.east.max(p.lng),
                },
            })
        })
    }

    /// Grow by `ratio` of the span on each side.
    pub fn pad(self, ratio: f64) -> Self {
        let lat_buffer = (self.north - self.south).abs() * ratio;
        let lng_buffer = (self.east - self.west).abs() * ratio;
        Bounds {
            south: self.south - lat_buffer,
            west: self.west - lng_buffer,
            north: self.north + lat_buffer,
            east: self.east + lng_buffer,
        }
    }

    pub fn contains(&self, point: &LatLng) -> bool {
        (self.south..=self.north).contains(&point.lat) && (self.west..=self.east).contains(&point.lng)
    }

    pub fn center(&self) -> LatLng {
        LatLng::new(
            (self.south + self.north) / 2.0,
            (self.west + self.east) / 2.0,
        )
    }
}

/// How the view is currently framed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Viewport {
    Centered { center: LatLng, zoom: u8 },
    Fitted(Bounds),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderReport {
    pub removed: usize,
    pub drawn: usize,
    /// Records without both coordinates
    pub skipped: usize,
    pub reframed: bool,
}

#[derive(Debug, Clone)]
pub struct MarkerReconciler {
    markers: Vec<Marker>,
    viewport: Viewport,
    renders: u64,
}

impl MarkerReconciler {
    pub fn new(initial: Viewport) -> Self {
        Self {
            markers: Vec::new(),
            viewport: initial,
            renders: 0,
        }
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn renders(&self) -> u64 {
        self.renders
    }

    /// Replace the marker set with `records` and frame the result.
    pub fn render(&mut self, records: &[ListingRecord]) -> RenderReport {
        let removed = self.markers.len();
        self.markers.clear();

        self.markers
            .extend(records.iter().filter_map(Marker::for_record));
        let drawn = self.markers.len();

        let reframed = match Bounds::around(self.markers.iter().map(|m| &m.position)) {
            Some(bounds) => {
                self.viewport = Viewport::Fitted(bounds.pad(FIT_PADDING));
                true
            }
            None => false,
        };

        self.renders += 1;
        let report = RenderReport {
            removed,
            drawn,
            skipped: records.len() - drawn,
            reframed,
        };
        tracing::debug!(?report, "markers rendered");
        report
    }

    pub fn center_on(&mut self, center: LatLng) {
        self.viewport = Viewport::Centered {
            center,
            zoom: CENTER_ZOOM,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn start() -> Viewport {
        Viewport::Centered {
            center: LatLng::new(28.6139, 77.2090),
            zoom: 12,
        }
    }

    fn record(id: &str, lat: Option<f64>, lng: Option<f64>) -> ListingRecord {
        ListingRecord {
            id: id.to_string(),
            name: format!("PG {id}"),
            price: 4000.0,
            lat,
            lng,
            location: "Delhi".to_string(),
            available: true,
        }
    }

    fn drawn_ids(reconciler: &MarkerReconciler) -> Vec<&str> {
        reconciler
            .markers()
            .iter()
            .map(|m| m.record_id.as_str())
            .collect()
    }

    #[test]
    fn test_full_replace_leaves_no_residue() {
        let mut reconciler = MarkerReconciler::new(start());
        reconciler.render(&[
            record("a", Some(28.6), Some(77.2)),
            record("b", Some(28.7), Some(77.1)),
        ]);
        assert_eq!(drawn_ids(&reconciler), vec!["a", "b"]);

        let report = reconciler.render(&[
            record("b", Some(28.7), Some(77.1)),
            record("c", Some(28.5), Some(77.3)),
        ]);
        assert_eq!(drawn_ids(&reconciler), vec!["b", "c"]);
        assert_eq!(report.removed, 2);
        assert_eq!(report.drawn, 2);
    }

    #[test]
    fn test_unplottable_records_never_draw() {
        let mut reconciler = MarkerReconciler::new(start());
        let report = reconciler.render(&[
            record("a", None, Some(77.2)),
            record("b", Some(28.6), None),
            record("c", None, None),
            record("d", Some(28.6), Some(77.2)),
        ]);
        assert_eq!(drawn_ids(&reconciler), vec!["d"]);
        assert_eq!(report.skipped, 3);
    }

    #[test]
    fn test_frame_covers_markers_with_padding() {
        let mut reconciler = MarkerReconciler::new(start());
        reconciler.render(&[
            record("a", Some(28.0), Some(77.0)),
            record("b", Some(29.0), Some(78.0)),
        ]);

        let Viewport::Fitted(frame) = reconciler.viewport() else {
            panic!("expected a fitted viewport");
        };
        assert_eq!(
            frame,
            Bounds {
                south: 27.75,
                west: 76.75,
                north: 29.25,
                east: 78.25,
            }
        );
        for marker in reconciler.markers() {
            assert!(frame.contains(&marker.position));
        }
    }

    #[test]
    fn test_empty_render_keeps_prior_frame() {
        let mut reconciler = MarkerReconciler::new(start());
        reconciler.render(&[record("a", Some(28.0), Some(77.0))]);
        let framed = reconciler.viewport();

        let report = reconciler.render(&[record("b", None, None)]);
        assert!(!report.reframed);
        assert_eq!(report.removed, 1);
        assert!(reconciler.markers().is_empty());
        assert_eq!(reconciler.viewport(), framed);

        let mut fresh = MarkerReconciler::new(start());
        fresh.render(&[]);
        assert_eq!(fresh.viewport(), start());
    }

    #[test]
    fn test_single_marker_frames_a_point() {
        let mut reconciler = MarkerReconciler::new(start());
        reconciler.render(&[record("a", Some(28.61), Some(77.2))]);
        let Viewport::Fitted(frame) = reconciler.viewport() else {
            panic!("expected a fitted viewport");
        };
        assert_eq!(frame.center(), LatLng::new(28.61, 77.2));
        assert!(frame.contains(&LatLng::new(28.61, 77.2)));
    }

    #[test]
    fn test_marker_label_shows_name_and_price() {
        let mut reconciler = MarkerReconciler::new(start());
        let mut r = record("a", Some(28.61), Some(77.2));
        r.name = "Sunrise PG".to_string();
        reconciler.render(&[r]);
        assert_eq!(reconciler.markers()[0].label, "Sunrise PG\nPrice: ₹4000");
    }

    #[test]
    fn test_center_on_uses_fixed_zoom() {
        let mut reconciler = MarkerReconciler::new(start());
        reconciler.center_on(LatLng::new(19.07, 72.87));
        assert_eq!(
            reconciler.viewport(),
            Viewport::Centered {
                center: LatLng::new(19.07, 72.87),
                zoom: CENTER_ZOOM
            }
        );
    }
}
