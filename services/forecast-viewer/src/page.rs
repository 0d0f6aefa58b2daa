//! The selection page served at `/`.

use chrono::NaiveDate;

use forecast_common::time::MAX_FORECAST_HOUR;
use forecast_common::{ModelCycle, Parameter, Region};

/// Render the selection form with the given preselected run date and region.
pub fn index_html(default_date: NaiveDate, default_region: &str) -> String {
    let hours: String = ModelCycle::all_4x_daily()
        .iter()
        .map(|c| format!(r#"<option value="{0}">{0}</option>"#, c.label()))
        .collect();
    let parameters: String = Parameter::all()
        .iter()
        .map(|p| format!(r#"<option value="{0}">{0}</option>"#, p.display_name()))
        .collect();
    let regions: String = Region::all()
        .iter()
        .map(|r| {
            let selected = if r.id == default_region { " selected" } else { "" };
            format!(r#"<option value="{}"{}>{}</option>"#, r.id, selected, r.name)
        })
        .collect();

    PAGE.replace("{{DATE}}", &default_date.format("%Y-%m-%d").to_string())
        .replace("{{HOURS}}", &hours)
        .replace("{{MAX_STEP}}", &MAX_FORECAST_HOUR.to_string())
        .replace("{{PARAMETERS}}", &parameters)
        .replace("{{REGIONS}}", &regions)
}

const PAGE: &str = r#"<!DOCTYPE html>
<html lang="id">
<head>
<meta charset="utf-8">
<title>Cuaca Sabu Raijua</title>
<style>
  body { font-family: sans-serif; margin: 0; display: flex; min-height: 100vh; }
  aside { width: 280px; padding: 16px; background: #f0f2f6; }
  main { flex: 1; padding: 16px 32px; }
  label { display: block; margin-top: 12px; font-size: 14px; }
  select, input { width: 100%; margin-top: 4px; }
  button { margin-top: 20px; width: 100%; padding: 8px; }
  #status { padding: 8px 12px; border-radius: 4px; display: none; }
  #status.success { display: block; background: #dff5e3; color: #1e6b32; }
  #status.warning { display: block; background: #fff6d9; color: #7a5b00; }
  #status.error { display: block; background: #fde2e2; color: #8a1f1f; }
  #map { margin-top: 16px; max-width: 100%; }
</style>
</head>
<body>
<aside>
  <h3>Pengaturan Visualisasi</h3>
  <label>Tanggal Run GFS (UTC)<input type="date" id="date" value="{{DATE}}"></label>
  <label>Jam Run GFS (UTC)<select id="hour">{{HOURS}}</select></label>
  <label>Jam Prediksi ke Depan: <span id="step-value">0</span>
    <input type="range" id="step" min="0" max="{{MAX_STEP}}" step="1" value="0"></label>
  <label>Pilih Parameter Cuaca<select id="parameter">{{PARAMETERS}}</select></label>
  <label>Wilayah<select id="region">{{REGIONS}}</select></label>
  <button id="show">Tampilkan Visualisasi</button>
</aside>
<main>
  <h1>Prakiraan Cuaca Wilayah Kabupaten Sabu Raijua</h1>
  <p>Visualisasi Realtime dari Model GFS via NOAA/NOMADS</p>
  <div id="status"></div>
  <img id="map" alt="">
</main>
<script>
const $ = (id) => document.getElementById(id);
$("step").addEventListener("input", () => { $("step-value").textContent = $("step").value; });

function showStatus(kind, text) {
  $("status").className = kind;
  $("status").textContent = text;
}

$("show").addEventListener("click", async () => {
  const params = new URLSearchParams({
    date: $("date").value,
    hour: $("hour").value,
    step: $("step").value,
    parameter: $("parameter").value,
    region: $("region").value,
  });
  $("show").disabled = true;
  try {
    const res = await fetch("/api/render?" + params);
    if (res.ok) {
      const blob = await res.blob();
      $("map").src = URL.createObjectURL(blob);
      showStatus("success", res.headers.get("x-status-message") || "");
    } else {
      const body = await res.json();
      $("map").removeAttribute("src");
      showStatus(body.status, body.message);
    }
  } catch (e) {
    showStatus("error", String(e));
  } finally {
    $("show").disabled = false;
  }
});
</script>
</body>
</html>
"#;
