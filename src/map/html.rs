//! Leaflet document rendering.

use crate::config::MapConfig;
use crate::constants::map::{CLICK_DECIMALS, LEAFLET_VERSION, MAX_ZOOM};
use crate::map::{ConfidenceTier, GalleryStats, MapView};
use crate::store::Sighting;
use serde::Serialize;
use std::fmt::Write as _;
use std::path::Path;

const TEMPLATE: &str = r#"<!doctype html>
<html lang="en">
<head>
  <meta charset="utf-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1" />
  <title>__TITLE__</title>
  <link rel="stylesheet" href="https://cdnjs.cloudflare.com/ajax/libs/leaflet/__LEAFLET__/leaflet.css" crossorigin="anonymous" />
  <script src="https://cdnjs.cloudflare.com/ajax/libs/leaflet/__LEAFLET__/leaflet.js" crossorigin="anonymous"></script>
  <link rel="stylesheet" href="https://cdnjs.cloudflare.com/ajax/libs/font-awesome/4.7.0/css/font-awesome.min.css" />
  <link rel="stylesheet" href="https://cdnjs.cloudflare.com/ajax/libs/Leaflet.awesome-markers/2.0.2/leaflet.awesome-markers.css" />
  <script src="https://cdnjs.cloudflare.com/ajax/libs/Leaflet.awesome-markers/2.0.2/leaflet.awesome-markers.js"></script>
  <style>
    html, body { height: 100%; margin: 0; }
    #map { height: 100%; width: 100%; }
    .stats-panel {
      position: fixed; top: 10px; left: 60px; z-index: 1000;
      background: rgba(255, 255, 255, 0.9); padding: 10px;
      border-radius: 8px; border: 2px solid #4CAF50; font-family: Arial, sans-serif;
    }
    .stats-panel h4 { margin: 0 0 10px 0; color: #2E7D32; }
    .sighting-popup { text-align: center; }
    .sighting-popup table { width: 100%; font-size: 12px; }
    .sighting-popup img { border-radius: 8px; border: 2px solid #4CAF50; }
  </style>
</head>
<body>
  <div id="map"></div>
  __OVERLAY__
  <script>
    const map = L.map('map').setView(__CENTER__, __ZOOM__);
    L.tileLayer('https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png', {
      maxZoom: __MAX_ZOOM__,
      attribution: '&copy; OpenStreetMap contributors'
    }).addTo(map);

    const markers = __MARKERS__;
    for (const m of markers) {
      const icon = L.AwesomeMarkers.icon({ icon: m.icon, prefix: 'fa', markerColor: m.color });
      const marker = L.marker([m.lat, m.lon], { icon: icon }).addTo(map);
      marker.bindPopup(m.popup, { maxWidth: m.max_width });
      if (m.tooltip) {
        marker.bindTooltip(m.tooltip);
      }
    }

    map.on('click', function (e) {
      const lat = e.latlng.lat.toFixed(__DECIMALS__);
      const lng = e.latlng.lng.toFixed(__DECIMALS__);
      L.popup()
        .setLatLng(e.latlng)
        .setContent('<b>Coordinates:</b><br>Latitude: ' + lat + '<br>Longitude: ' + lng)
        .openOn(map);
      console.log('Latitude: ' + lat + ', Longitude: ' + lng);
    });
  </script>
</body>
</html>
"#;

#[derive(Debug, Serialize)]
struct Marker {
    lat: f64,
    lon: f64,
    color: &'static str,
    icon: &'static str,
    popup: String,
    tooltip: Option<String>,
    max_width: u32,
}

/// Render a complete HTML document for `view`.
pub fn render_html(view: &MapView<'_>, settings: &MapConfig) -> String {
    let regional_centre = [settings.center_latitude, settings.center_longitude];

    let (title, centre, zoom, markers, overlay) = match view {
        MapView::Point {
            coordinates,
            confidence,
            detections_count,
            image,
        } => (
            "Iguana sighting",
            [coordinates.latitude(), coordinates.longitude()],
            settings.point_zoom,
            vec![point_marker(
                coordinates.latitude(),
                coordinates.longitude(),
                *confidence,
                *detections_count,
                *image,
            )],
            String::new(),
        ),
        MapView::Gallery { sightings } => (
            "Iguana sightings",
            regional_centre,
            settings.overview_zoom,
            sightings
                .iter()
                .enumerate()
                .map(|(index, sighting)| gallery_marker(index, sighting))
                .collect(),
            stats_panel(&GalleryStats::from_sightings(sightings)),
        ),
        MapView::Explore => (
            "Explore",
            regional_centre,
            settings.overview_zoom,
            Vec::new(),
            String::new(),
        ),
    };

    TEMPLATE
        .replace("__TITLE__", title)
        .replace("__LEAFLET__", LEAFLET_VERSION)
        .replace("__OVERLAY__", &overlay)
        .replace("__CENTER__", &script_json(&centre))
        .replace("__ZOOM__", &zoom.to_string())
        .replace("__MAX_ZOOM__", &MAX_ZOOM.to_string())
        .replace("__MARKERS__", &script_json(&markers))
        .replace("__DECIMALS__", &CLICK_DECIMALS.to_string())
}

fn point_marker(
    latitude: f64,
    longitude: f64,
    confidence: f32,
    detections_count: u32,
    image: Option<&Path>,
) -> Marker {
    let mut popup = format!(
        "<div style='width: 250px;'>\
         <b>Sighting location</b><br>\
         <b>Coordinates:</b><br>Lat: {latitude:.6}<br>Lng: {longitude:.6}<br>\
         <b>Detection:</b><br>Confidence: {:.1}%<br>Count: {detections_count}<br>\
         </div>",
        confidence * 100.0
    );
    if let Some(path) = image.filter(|p| p.exists()) {
        let _ = write!(
            popup,
            "<br><img src=\"{}\" width=\"200\" height=\"150\" style=\"border-radius: 5px;\">",
            escape_html(&file_url(path))
        );
    }

    let tier = ConfidenceTier::Affirmative;
    Marker {
        lat: latitude,
        lon: longitude,
        color: tier.color(),
        icon: tier.icon(),
        popup,
        tooltip: None,
        max_width: 270,
    }
}

fn gallery_marker(index: usize, sighting: &Sighting) -> Marker {
    let confidence = sighting.detection_confidence.unwrap_or(0.0);
    let count = sighting.detections_count.unwrap_or(0);
    let date = escape_html(&sighting.display_date());
    let percent = confidence * 100.0;

    let mut popup = format!(
        "<div class='sighting-popup' style='width: 280px;'>\
         <h4 style='margin: 5px 0; color: #2E7D32;'>Sighting #{number}</h4>\
         <hr style='margin: 5px 0;'>\
         <table>\
         <tr><td><b>Date:</b></td><td>{date}</td></tr>\
         <tr><td><b>Coordinates:</b></td><td>{lat:.6}, {lon:.6}</td></tr>\
         <tr><td><b>Confidence:</b></td><td>{percent:.1}%</td></tr>\
         <tr><td><b>Count:</b></td><td>{count}</td></tr>\
         </table>",
        number = index + 1,
        lat = sighting.latitude,
        lon = sighting.longitude,
    );

    if sighting.saved_image_path.exists() {
        let _ = write!(
            popup,
            "<hr style='margin: 10px 0;'><img src=\"{}\" width=\"240\" height=\"180\">",
            escape_html(&file_url(&sighting.saved_image_path))
        );
    } else {
        popup.push_str("<br><i>Image not available</i>");
    }
    popup.push_str("</div>");

    let tier = ConfidenceTier::from_confidence(confidence);
    Marker {
        lat: sighting.latitude,
        lon: sighting.longitude,
        color: tier.color(),
        icon: tier.icon(),
        popup,
        tooltip: Some(format!("Sighting {date} - {percent:.1}%")),
        max_width: 300,
    }
}

fn stats_panel(stats: &GalleryStats) -> String {
    format!(
        "<div class=\"stats-panel\">\
         <h4>Statistics</h4>\
         <div><b>Total sightings:</b> {}</div>\
         <div><b>Total iguanas:</b> {}</div>\
         <div><b>Average confidence:</b> {:.1}%</div>\
         </div>",
        stats.total_sightings,
        stats.total_iguanas,
        stats.mean_confidence * 100.0
    )
}

/// JSON safe to embed inside a `<script>` element.
fn script_json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string(value)
        .unwrap_or_else(|_| "null".to_string())
        .replace("</", "<\\/")
}

fn file_url(path: &Path) -> String {
    let path = path.to_string_lossy().replace('\\', "/");
    format!("file:///{}", path.trim_start_matches('/'))
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::geo::Coordinates;
    use crate::map::tests::sighting;
    use tempfile::TempDir;

    fn settings() -> MapConfig {
        MapConfig::default()
    }

    #[test]
    fn test_explore_map_is_regional_and_empty() {
        let html = render_html(&MapView::Explore, &settings());
        assert!(html.contains("setView([8.9943,-79.5188], 8)"));
        assert!(html.contains("const markers = [];"));
        assert!(html.contains("toFixed(6)"));
        assert!(!html.contains("stats-panel\">"));
    }

    #[test]
    fn test_point_map_centres_on_coordinates() {
        let view = MapView::Point {
            coordinates: Coordinates::new(9.1234, -79.5).unwrap(),
            confidence: 0.875,
            detections_count: 2,
            image: None,
        };
        let html = render_html(&view, &settings());
        assert!(html.contains("setView([9.1234,-79.5], 15)"));
        assert!(html.contains("Confidence: 87.5%"));
        assert!(html.contains("Lat: 9.123400"));
        assert!(html.contains("\"color\":\"green\""));
        assert!(html.contains("\"icon\":\"leaf\""));
        assert!(!html.contains("<img"));
    }

    #[test]
    fn test_point_map_shows_existing_image() {
        let dir = TempDir::new().unwrap();
        let image = dir.path().join("photo.jpg");
        std::fs::write(&image, b"x").unwrap();

        let view = MapView::Point {
            coordinates: Coordinates::new(9.0, -80.0).unwrap(),
            confidence: 0.9,
            detections_count: 1,
            image: Some(&image),
        };
        let html = render_html(&view, &settings());
        assert!(html.contains("file:///"));
        assert!(html.contains("photo.jpg"));
    }

    #[test]
    fn test_gallery_markers_follow_tiers_and_order() {
        let dir = TempDir::new().unwrap();
        let present = dir.path().join("kept.jpg");
        std::fs::write(&present, b"x").unwrap();
        let missing = dir.path().join("gone.jpg");

        let sightings = vec![
            sighting(3, 0.81, 2, &present),
            sighting(2, 0.65, 1, &missing),
            sighting(1, 0.10, 1, &missing),
        ];
        let html = render_html(&MapView::Gallery { sightings: &sightings }, &settings());

        let green = html.find("\"color\":\"green\"").unwrap();
        let orange = html.find("\"color\":\"orange\"").unwrap();
        let red = html.find("\"color\":\"red\"").unwrap();
        assert!(green < orange && orange < red);

        assert!(html.contains("Sighting #1"));
        assert!(html.contains("Sighting #3"));
        assert!(html.contains("Image not available"));
        assert!(html.contains("kept.jpg"));
        assert!(html.contains("Sighting 01/03/2025 10:15 - 81.0%"));
        assert!(html.contains("<b>Total sightings:</b> 3"));
        assert!(html.contains("<b>Total iguanas:</b> 4"));
        assert!(html.contains("<b>Average confidence:</b> 52.0%"));
        assert!(html.contains("setView([8.9943,-79.5188], 8)"));
    }

    #[test]
    fn test_embedded_json_cannot_close_script() {
        let json = script_json(&vec!["</script><script>alert(1)</script>"]);
        assert!(!json.contains("</script>"));
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html("<a href=\"x\">&'"),
            "&lt;a href=&quot;x&quot;&gt;&amp;&#39;"
        );
    }

    #[test]
    fn test_file_url() {
        assert_eq!(file_url(Path::new("/tmp/a b.jpg")), "file:///tmp/a b.jpg");
        assert_eq!(file_url(Path::new("C:\\pics\\a.jpg")), "file:///C:/pics/a.jpg");
    }
}
