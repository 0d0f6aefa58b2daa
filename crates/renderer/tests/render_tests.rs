//! End-to-end map rendering tests.

use chrono::{TimeZone, Utc};
use image::RgbaImage;

use forecast_common::grid::grids;
use forecast_common::{BoundingBox, ForecastStep, GriddedField, Parameter, Region};
use renderer::plot::{PlotSpec, DEFAULT_SIZE};
use renderer::{BaseMap, Color, MapFrame, MapRenderer, TextRenderer};
use test_utils::{
    constant_field, precipitation_field, pressure_field, require_test_file, temp_test_dir,
    wind_fields,
};

fn valid_time() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 5, 6, 0, 0).unwrap()
}

fn pixel(img: &RgbaImage, x: f32, y: f32) -> [u8; 4] {
    img.get_pixel(x.round() as u32, y.round() as u32).0
}

fn frame_of(plot: &PlotSpec) -> MapFrame {
    MapFrame::layout(plot.size, plot.extent, plot.colorbar.is_some())
}

fn precipitation_plot(region: &Region, value: f32) -> PlotSpec {
    let spec = Parameter::PrecipitationRate.spec(ForecastStep::new(0).unwrap());
    let field = constant_field("pratesfc", &region.bbox, value);
    PlotSpec::configure(field, None, &spec, region, &valid_time(), DEFAULT_SIZE).unwrap()
}

#[test]
fn test_png_signature_and_size() {
    let region = Region::builtin("ntt").unwrap();
    let png = MapRenderer::default()
        .render(&precipitation_plot(&region, 12.0))
        .unwrap();

    assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
    let decoded = image::load_from_memory(&png).unwrap();
    assert_eq!((decoded.width(), decoded.height()), DEFAULT_SIZE);
}

#[test]
fn test_filled_cells_use_colormap() {
    let region = Region::builtin("ntt").unwrap();
    let plot = precipitation_plot(&region, 25.0);
    let img = MapRenderer::default().render_image(&plot).unwrap();

    let frame = frame_of(&plot);
    let centre = pixel(&img, frame.x0 + frame.width / 2.0, frame.y0 + frame.height / 2.0);
    // Midpoint of the 0..50 Blues scale.
    assert_eq!(centre, [0x6b, 0xae, 0xd6, 255]);

    // Outside the frame stays white.
    assert_eq!(pixel(&img, 5.0, 5.0), [255, 255, 255, 255]);
}

#[test]
fn test_scattered_rain_uses_several_shades() {
    let region = Region::builtin("ntt").unwrap();
    let spec = Parameter::PrecipitationRate.spec(ForecastStep::new(0).unwrap());
    let field = precipitation_field(&region.bbox, 7).map("pratesfc", |rate| rate * 3600.0);
    let plot = PlotSpec::configure(field, None, &spec, &region, &valid_time(), DEFAULT_SIZE)
        .unwrap();
    let img = MapRenderer::default().render_image(&plot).unwrap();

    let frame = frame_of(&plot);
    let mut shades = std::collections::HashSet::new();
    for y in (frame.y0 as u32 + 2..frame.y1() as u32 - 2).step_by(3) {
        for x in (frame.x0 as u32 + 2..frame.x1() as u32 - 2).step_by(3) {
            shades.insert(img.get_pixel(x, y).0);
        }
    }
    assert!(shades.len() >= 3, "only {} shades", shades.len());
}

#[test]
fn test_marker_drawn_red() {
    let region = Region::builtin("ntt").unwrap();
    let plot = precipitation_plot(&region, 0.0);
    let img = MapRenderer::default().render_image(&plot).unwrap();

    let at = frame_of(&plot).to_pixel(121.85, -10.525);
    let [r, g, b, _] = pixel(&img, at.x, at.y);
    assert_eq!((r, g, b), (255, 0, 0));
}

#[test]
fn test_colorbar_strip_beside_map() {
    let region = Region::builtin("ntt").unwrap();
    let plot = precipitation_plot(&region, 0.0);
    let img = MapRenderer::default().render_image(&plot).unwrap();
    let frame = frame_of(&plot);

    // Colorbar top holds the darkest blue, bottom the lightest.
    let x = frame.x1() + 14.0 + 9.0;
    let top = pixel(&img, x, frame.y0 + 3.0);
    let bottom = pixel(&img, x, frame.y1() - 3.0);
    assert!(top[2] < bottom[2] || top[0] < bottom[0]);
    assert!(top[0] < 40);
    assert!(bottom[0] > 200);
}

#[test]
fn test_land_and_ocean_under_contours() {
    let region = Region::builtin("ntt").unwrap();
    let land = r#"{"type": "Polygon", "coordinates": [[[120.0,-10.0],[124.0,-10.0],[124.0,-8.0],[120.0,-8.0],[120.0,-10.0]]]}"#;
    let dir = temp_test_dir();
    let path = dir.path().join("land.geojson");
    std::fs::write(&path, land).unwrap();
    let basemap = BaseMap::from_file(&path).unwrap();
    assert_eq!(basemap, BaseMap::from_geojson_str(land).unwrap());
    let renderer = MapRenderer::new(None, basemap);

    // Flat pressure: no contour levels, only the base map shows.
    let spec = Parameter::MeanSeaLevelPressure.spec(ForecastStep::new(0).unwrap());
    let field = constant_field("prmsl", &region.bbox, 1010.0);
    let plot = PlotSpec::configure(field, None, &spec, &region, &valid_time(), DEFAULT_SIZE).unwrap();
    let img = renderer.render_image(&plot).unwrap();
    let frame = frame_of(&plot);

    let on_land = frame.to_pixel(122.0, -9.0);
    let at_sea = frame.to_pixel(125.0, -11.0);
    assert_eq!(pixel(&img, on_land.x, on_land.y), Color::LIGHT_GRAY.to_rgba().0);
    assert_eq!(pixel(&img, at_sea.x, at_sea.y), Color::LIGHT_BLUE.to_rgba().0);

    // Coastline is drawn in black along the polygon edge.
    let coast = frame.to_pixel(122.0, -8.0);
    let [r, _, _, _] = img.get_pixel(coast.x as u32, coast.y as u32).0;
    assert!(r < 120);
}

#[test]
fn test_pressure_contours_draw_lines() {
    let region = Region::builtin("ntt").unwrap();
    let spec = Parameter::MeanSeaLevelPressure.spec(ForecastStep::new(0).unwrap());
    let field = pressure_field(&region.bbox).map("prmsl", |pa| pa / 100.0);
    let plot = PlotSpec::configure(field, None, &spec, &region, &valid_time(), DEFAULT_SIZE).unwrap();
    let img = MapRenderer::default().render_image(&plot).unwrap();
    let frame = frame_of(&plot);

    let dark = img
        .enumerate_pixels()
        .filter(|(x, y, p)| {
            let inside = (*x as f32) > frame.x0 + 2.0
                && (*x as f32) < frame.x1() - 2.0
                && (*y as f32) > frame.y0 + 2.0
                && (*y as f32) < frame.y1() - 2.0;
            inside && p.0[0] < 80 && p.0[1] < 80 && p.0[2] < 80
        })
        .count();
    assert!(dark > 100, "expected contour pixels, found {}", dark);
}

#[test]
fn test_wind_arrows_render() {
    let region = Region::builtin("sabu-raijua").unwrap();
    let spec = Parameter::Wind10m.spec(ForecastStep::new(0).unwrap());
    let (u, v) = wind_fields(&region.bbox);
    let speed = u.zip_map(&v, "wind", |a, b| (a * a + b * b).sqrt() * 1.94384).unwrap();
    let plot = PlotSpec::configure(speed, Some((u, v)), &spec, &region, &valid_time(), DEFAULT_SIZE)
        .unwrap();

    let png = MapRenderer::default().render(&plot).unwrap();
    assert_eq!(&png[..4], b"\x89PNG");
}

#[test]
fn test_titles_drawn_with_embedded_font() {
    let region = Region::builtin("ntt").unwrap();
    let plot = precipitation_plot(&region, 5.0);
    let frame = frame_of(&plot);
    // Rows above the frame outline.
    let title_ink = |img: &RgbaImage| {
        (0..(frame.y0 as u32).saturating_sub(3))
            .flat_map(|y| (0..img.width()).map(move |x| (x, y)))
            .filter(|&(x, y)| img.get_pixel(x, y).0[0] < 128)
            .count()
    };

    let font = TextRenderer::embedded().unwrap();
    let with_text = MapRenderer::new(Some(font), BaseMap::empty())
        .render_image(&plot)
        .unwrap();
    let without_text = MapRenderer::default().render_image(&plot).unwrap();

    assert!(title_ink(&with_text) > 50);
    assert_eq!(title_ink(&without_text), 0);
}

#[test]
fn test_font_loaded_from_file() {
    let path = require_test_file!("DejaVuSans.ttf");
    let font = TextRenderer::from_file(&path).unwrap();
    let renderer = MapRenderer::new(Some(font), BaseMap::empty());
    assert!(renderer.has_font());

    let png = renderer
        .render(&precipitation_plot(&Region::builtin("sabu-raijua").unwrap(), 5.0))
        .unwrap();
    assert_eq!(&png[..4], b"\x89PNG");
}

#[test]
fn test_window_across_prime_meridian() {
    // Global field that is 50 mm/h on the 0° meridian only.
    let lats = grids::gfs_0p25_lats();
    let lons = grids::gfs_0p25_lons();
    let values = lats
        .iter()
        .flat_map(|_| lons.iter().map(|&lon| if lon == 0.0 { 50.0 } else { 0.0 }))
        .collect();
    let global = GriddedField::new("pratesfc", lats, lons, values).unwrap();

    let region = Region::custom(BoundingBox::new(-1.0, 0.0, 1.0, 1.0)).unwrap();
    let field = global.subset(&region.bbox).unwrap();
    let spec = Parameter::PrecipitationRate.spec(ForecastStep::new(0).unwrap());
    let plot = PlotSpec::configure(field, None, &spec, &region, &valid_time(), DEFAULT_SIZE)
        .unwrap();
    let img = MapRenderer::default().render_image(&plot).unwrap();
    let frame = frame_of(&plot);

    let on_meridian = frame.to_pixel(0.0, 0.5);
    let [r, g, b, _] = pixel(&img, on_meridian.x, on_meridian.y);
    assert!(r < 40 && g < 80 && b > 90, "meridian pixel {:?}", [r, g, b]);

    for lon in [-0.5, 0.5] {
        let p = frame.to_pixel(lon, 0.5);
        assert!(pixel(&img, p.x, p.y)[0] > 230, "lon {} should be near white", lon);
    }
}

#[test]
fn test_bundled_basemap_shows_land() {
    let region = Region::builtin("ntt").unwrap();
    let renderer = MapRenderer::new(None, BaseMap::bundled().unwrap());
    let spec = Parameter::MeanSeaLevelPressure.spec(ForecastStep::new(0).unwrap());
    let field = constant_field("prmsl", &region.bbox, 1010.0);
    let plot = PlotSpec::configure(field, None, &spec, &region, &valid_time(), DEFAULT_SIZE).unwrap();
    let img = renderer.render_image(&plot).unwrap();
    let frame = frame_of(&plot);

    let timor = frame.to_pixel(124.5, -9.7);
    let flores = frame.to_pixel(121.0, -8.65);
    let savu_sea = frame.to_pixel(120.5, -11.0);
    assert_eq!(pixel(&img, timor.x, timor.y), Color::LIGHT_GRAY.to_rgba().0);
    assert_eq!(pixel(&img, flores.x, flores.y), Color::LIGHT_GRAY.to_rgba().0);
    assert_eq!(pixel(&img, savu_sea.x, savu_sea.y), Color::LIGHT_BLUE.to_rgba().0);
}
