use rand::Rng;

use super::repo_types::Point;

const POLYLINE_PRECISION: f64 = 1e5;

/// Encodes points with the Google polyline algorithm (precision 5, lat/lng order).
pub fn encode_polyline(points: &[Point]) -> String {
    let mut out = String::with_capacity(points.len() * 8);
    let (mut prev_lat, mut prev_lng) = (0i64, 0i64);
    for p in points {
        let lat = (p.latitude * POLYLINE_PRECISION).round() as i64;
        let lng = (p.longitude * POLYLINE_PRECISION).round() as i64;
        encode_value(lat - prev_lat, &mut out);
        encode_value(lng - prev_lng, &mut out);
        prev_lat = lat;
        prev_lng = lng;
    }
    out
}

fn encode_value(delta: i64, out: &mut String) {
    let mut v = (if delta < 0 { !(delta << 1) } else { delta << 1 }) as u64;
    while v >= 0x20 {
        out.push(char::from((((v & 0x1f) | 0x20) + 63) as u8));
        v >>= 5;
    }
    out.push(char::from((v + 63) as u8));
}

/// Static map image of the route drawn as a red path.
pub fn preview_url(api_url: &str, token: &str, points: &[Point]) -> String {
    let line = encode_polyline(points);
    format!(
        "{}/styles/v1/mapbox/streets-v11/static/path-5+f44-0.9({})/auto/500x300?access_token={}",
        api_url.trim_end_matches('/'),
        urlencoding::encode(&line),
        token
    )
}

/// A saturated, mid-light HSL color for drawing a route.
pub fn random_color() -> String {
    let mut rng = rand::thread_rng();
    let h: f64 = rng.gen_range(0.0..358.0);
    let s: u8 = rng.gen_range(80..=100);
    let l: u8 = rng.gen_range(45..=55);
    format!("hsl({h:.1}, {s}%, {l}%)")
}
