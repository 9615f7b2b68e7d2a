//! Spherical Web-Mercator geometry used to place markers and fit the viewport

use std::f64::consts::PI;

use inmo_types::Coordinates;

/// Edge of a map tile in pixels
pub const TILE_SIZE: f64 = 256.0;

/// Deepest zoom offered by the tile provider
pub const MAX_ZOOM: f64 = 19.0;

/// Latitudes beyond this cannot be projected
const MAX_LATITUDE: f64 = 85.051_128_779_806_6;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelPoint {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportSize {
    pub width: f64,
    pub height: f64,
}

/// Axis-aligned geographic box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoBounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl GeoBounds {
    /// Smallest box containing every point, `None` for an empty input
    pub fn from_points<'a, I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Coordinates>,
    {
        points.into_iter().fold(None, |acc, p| {
            Some(match acc {
                None => GeoBounds {
                    south: p.lat,
                    west: p.lng,
                    north: p.lat,
                    east: p.lng,
                },
                Some(b) => GeoBounds {
                    south: b.south.min(p.lat),
                    west: b.west.min(p.lng),
                    north: b.north.max(p.lat),
                    east: b.east.max(p.lng),
                },
            })
        })
    }

    pub fn contains(&self, p: &Coordinates) -> bool {
        p.lat >= self.south && p.lat <= self.north && p.lng >= self.west && p.lng <= self.east
    }
}

/// Arithmetic mean of latitude and longitude
pub fn mean_center(points: &[Coordinates]) -> Option<Coordinates> {
    if points.is_empty() {
        return None;
    }
    let n = points.len() as f64;
    let (lat, lng) = points
        .iter()
        .fold((0.0, 0.0), |(lat, lng), p| (lat + p.lat, lng + p.lng));
    Some(Coordinates {
        lat: lat / n,
        lng: lng / n,
    })
}

fn world_size(zoom: f64) -> f64 {
    TILE_SIZE * 2f64.powf(zoom)
}

/// Project a position to absolute pixel coordinates at `zoom`
pub fn project(p: Coordinates, zoom: f64) -> PixelPoint {
    let size = world_size(zoom);
    let lat = p.lat.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
    PixelPoint {
        x: size * (p.lng + 180.0) / 360.0,
        y: size * (1.0 - (lat.tan() + 1.0 / lat.cos()).ln() / PI) / 2.0,
    }
}

/// Inverse of [`project`]
pub fn unproject(p: PixelPoint, zoom: f64) -> Coordinates {
    let size = world_size(zoom);
    let n = PI - 2.0 * PI * p.y / size;
    Coordinates {
        lat: n.sinh().atan().to_degrees(),
        lng: p.x / size * 360.0 - 180.0,
    }
}

/// Largest whole zoom at which `bounds` fits in `viewport` minus `padding` on
/// every side
pub fn bounds_zoom(bounds: &GeoBounds, viewport: ViewportSize, padding: f64, max_zoom: f64) -> f64 {
    let avail_w = (viewport.width - 2.0 * padding).max(1.0);
    let avail_h = (viewport.height - 2.0 * padding).max(1.0);

    let nw = project(Coordinates { lat: bounds.north, lng: bounds.west }, 0.0);
    let se = project(Coordinates { lat: bounds.south, lng: bounds.east }, 0.0);
    let span_w = (se.x - nw.x).abs();
    let span_h = (se.y - nw.y).abs();

    if span_w == 0.0 && span_h == 0.0 {
        return max_zoom;
    }

    let scale_w = if span_w > 0.0 { avail_w / span_w } else { f64::INFINITY };
    let scale_h = if span_h > 0.0 { avail_h / span_h } else { f64::INFINITY };
    let zoom = scale_w.min(scale_h).log2().floor();

    zoom.clamp(0.0, max_zoom)
}

/// Center and zoom showing all of `bounds`
pub fn fit_bounds(
    bounds: &GeoBounds,
    viewport: ViewportSize,
    padding: f64,
    max_zoom: f64,
) -> (Coordinates, f64) {
    let zoom = bounds_zoom(bounds, viewport, padding, max_zoom);
    let nw = project(Coordinates { lat: bounds.north, lng: bounds.west }, zoom);
    let se = project(Coordinates { lat: bounds.south, lng: bounds.east }, zoom);
    let mid = PixelPoint {
        x: (nw.x + se.x) / 2.0,
        y: (nw.y + se.y) / 2.0,
    };
    (unproject(mid, zoom), zoom)
}

/// Position of `p` relative to the top-left corner of a viewport centred on
/// `center`
pub fn to_viewport(p: Coordinates, center: Coordinates, zoom: f64, viewport: ViewportSize) -> PixelPoint {
    let a = project(p, zoom);
    let c = project(center, zoom);
    PixelPoint {
        x: a.x - c.x + viewport.width / 2.0,
        y: a.y - c.y + viewport.height / 2.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(lat: f64, lng: f64) -> Coordinates {
        Coordinates { lat, lng }
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn test_project_origin() {
        let p = project(c(0.0, 0.0), 0.0);
        assert!(close(p.x, 128.0));
        assert!(close(p.y, 128.0));
    }

    #[test]
    fn test_project_round_trip() {
        let asuncion = c(-25.2637, -57.5759);
        let back = unproject(project(asuncion, 13.0), 13.0);
        assert!(close(back.lat, asuncion.lat));
        assert!(close(back.lng, asuncion.lng));
    }

    #[test]
    fn test_mean_center() {
        let center = mean_center(&[c(-25.0, -57.0), c(-26.0, -58.0)]).unwrap();
        assert!(close(center.lat, -25.5));
        assert!(close(center.lng, -57.5));
        assert!(mean_center(&[]).is_none());
    }

    #[test]
    fn test_bounds_from_points() {
        let pts = [c(-25.3, -57.6), c(-25.2, -57.5), c(-25.4, -57.55)];
        let b = GeoBounds::from_points(pts.iter()).unwrap();
        assert_eq!(b.south, -25.4);
        assert_eq!(b.north, -25.2);
        assert_eq!(b.west, -57.6);
        assert_eq!(b.east, -57.5);
        assert!(pts.iter().all(|p| b.contains(p)));
        assert!(GeoBounds::from_points(std::iter::empty()).is_none());
    }

    #[test]
    fn test_fit_bounds_keeps_points_inside_padded_viewport() {
        let pts = [c(-25.30, -57.65), c(-25.25, -57.55), c(-25.33, -57.58)];
        let bounds = GeoBounds::from_points(pts.iter()).unwrap();
        let viewport = ViewportSize { width: 600.0, height: 400.0 };
        let (center, zoom) = fit_bounds(&bounds, viewport, 60.0, MAX_ZOOM);

        assert!(zoom >= 0.0 && zoom <= MAX_ZOOM);
        assert_eq!(zoom.fract(), 0.0);
        for p in &pts {
            let v = to_viewport(*p, center, zoom, viewport);
            assert!(v.x >= 60.0 - 1e-6 && v.x <= 540.0 + 1e-6, "x out of view: {:?}", v);
            assert!(v.y >= 60.0 - 1e-6 && v.y <= 340.0 + 1e-6, "y out of view: {:?}", v);
        }

        // one level deeper must no longer fit
        let deeper = zoom + 1.0;
        let nw = project(c(bounds.north, bounds.west), deeper);
        let se = project(c(bounds.south, bounds.east), deeper);
        assert!(se.x - nw.x > 480.0 || se.y - nw.y > 280.0);
    }

    #[test]
    fn test_degenerate_bounds_use_max_zoom() {
        let p = c(-25.3, -57.6);
        let bounds = GeoBounds::from_points([p, p].iter()).unwrap();
        let viewport = ViewportSize { width: 600.0, height: 400.0 };
        assert_eq!(bounds_zoom(&bounds, viewport, 60.0, MAX_ZOOM), MAX_ZOOM);
    }
}
