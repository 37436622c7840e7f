//! ==============================================================================
//! page.rs - embedded dashboard page
//! ==============================================================================
//!
//! purpose:
//!     the single html page served at GET /. it fetches /api/dashboard as
//!     json and draws the widget model with chart.js: metric cards, the
//!     0-1023 gauge, temperature/humidity lines, voltage bars, the status
//!     pie, the fuel area, and the pump/generator indicators. control
//!     widgets post partial updates to /api/controls.
//!
//!     redraw is timer-driven in the browser (the interval comes from the
//!     model's refresh_ms); the server never blocks a render pass.
//!
//! ==============================================================================

pub const DASHBOARD_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Site Monitoring Dashboard</title>
    <script src="https://cdn.jsdelivr.net/npm/chart.js@4.4.0/dist/chart.umd.min.js"></script>
    <style>
        * { box-sizing: border-box; }
        body {
            margin: 0;
            font-family: system-ui, sans-serif;
            background: #1a1a2e;
            color: #eee;
        }
        .layout { display: flex; min-height: 100vh; }
        .sidebar {
            width: 260px;
            flex-shrink: 0;
            background: #16213e;
            padding: 1.5rem 1.25rem 5rem;
        }
        .sidebar h2 { margin-top: 0; font-size: 1.2rem; }
        .control { margin: 1.1rem 0; }
        .control label { display: block; font-size: 0.85rem; color: #9aa5ce; margin-bottom: 0.3rem; }
        .control select, .control input[type=range] { width: 100%; }
        .control .toggle { display: flex; align-items: center; gap: 0.5rem; color: #eee; font-size: 0.95rem; }
        .control button {
            width: 100%;
            padding: 0.5rem;
            border: none;
            border-radius: 6px;
            background: #0f3460;
            color: #eee;
            cursor: pointer;
        }
        .control button:hover { background: #16498c; }
        .main { flex-grow: 1; padding: 1.5rem 2rem 5rem; }
        .main h1 { margin-top: 0; }
        .banner {
            display: none;
            margin: 0 0 1rem;
            padding: 0.6rem 1rem;
            border-radius: 8px;
            font-size: 0.9rem;
        }
        .banner.stale { background: #7c5e10; }
        .banner.nodata { background: #7c1d2f; }
        .banner.feature { background: #14532d; }
        .cards { display: grid; grid-template-columns: repeat(auto-fill, minmax(180px, 1fr)); gap: 1rem; }
        .card {
            background: #16213e;
            border-radius: 10px;
            padding: 1rem;
        }
        .card .label { font-size: 0.8rem; color: #9aa5ce; }
        .card .value { font-size: 1.5rem; font-weight: 600; margin-top: 0.25rem; }
        .card .delta { font-size: 0.8rem; margin-top: 0.25rem; }
        .delta.inverse { color: #f87171; }
        .delta.plain { color: #4ade80; }
        .charts { display: grid; grid-template-columns: repeat(auto-fit, minmax(320px, 1fr)); gap: 1rem; margin-top: 1.5rem; }
        .chart-box { background: #16213e; border-radius: 10px; padding: 1rem; }
        .chart-box h3 { margin: 0 0 0.5rem; font-size: 1rem; }
        .chart-container { position: relative; height: 240px; }
        .gauge-center { text-align: center; margin-top: -120px; }
        .gauge-center .gauge-value { font-size: 1.8rem; font-weight: 700; }
        .gauge-center .gauge-delta { font-size: 0.9rem; }
        .switches { display: grid; grid-template-columns: 1fr 1fr; gap: 1rem; margin-top: 1.5rem; }
        .switch-card { background: #16213e; border-radius: 10px; padding: 1rem; text-align: center; }
        .switch-card .state { font-size: 1.6rem; font-weight: 700; margin-top: 0.3rem; color: #64748b; }
        .switch-card .state.on { color: #4ade80; }
        table.preview { width: 100%; border-collapse: collapse; margin-top: 0.5rem; font-size: 0.8rem; }
        table.preview th, table.preview td { border-bottom: 1px solid #0f3460; padding: 0.35rem 0.5rem; text-align: left; }
        table.preview th { color: #9aa5ce; font-weight: 500; }
        .footer {
            position: fixed;
            left: 0;
            bottom: 0;
            width: 100%;
            background: #333;
            color: white;
            text-align: center;
            padding: 10px 0;
            font-size: 0.85rem;
        }
    </style>
</head>
<body>
    <div class="layout">
        <aside class="sidebar">
            <h2>Controls</h2>
            <div class="control">
                <span class="toggle"><input type="checkbox" id="pumpToggle"> Pump Toggle</span>
            </div>
            <div class="control">
                <label for="displayMode">Displayed values:</label>
                <select id="displayMode">
                    <option value="Normalized">Normalized</option>
                    <option value="Absolute">Absolute</option>
                </select>
            </div>
            <div class="control">
                <span class="toggle"><input type="checkbox" id="featureToggle"> Activate feature</span>
            </div>
            <div class="control">
                <label for="pumpSeconds">Pump Seconds: <span id="pumpSecondsValue">0</span></label>
                <input type="range" id="pumpSeconds" min="0" max="60" step="1" value="0">
            </div>
            <div class="control">
                <button id="resetSlave">Reset Slave</button>
            </div>
            <div class="control">
                <span class="toggle"><input type="checkbox" id="generatorToggle"> Generator Toggle</span>
            </div>
        </aside>

        <main class="main">
            <h1>Dashboard</h1>
            <div id="staleBanner" class="banner stale">Showing stale data - the sensor feed could not be refreshed.</div>
            <div id="nodataBanner" class="banner nodata">No data available.</div>
            <div id="featureBanner" class="banner feature"></div>

            <div class="cards" id="metricCards"></div>

            <div class="charts">
                <div class="chart-box">
                    <h3>Gauge</h3>
                    <div class="chart-container"><canvas id="gaugeChart"></canvas></div>
                    <div class="gauge-center">
                        <div class="gauge-value" id="gaugeValue">-</div>
                        <div class="gauge-delta" id="gaugeDelta"></div>
                    </div>
                </div>
                <div class="chart-box">
                    <h3>Temperature Over Time</h3>
                    <div class="chart-container"><canvas id="tempChart"></canvas></div>
                </div>
                <div class="chart-box">
                    <h3>Humidity Over Time</h3>
                    <div class="chart-container"><canvas id="humidityChart"></canvas></div>
                </div>
                <div class="chart-box">
                    <h3>Site Status</h3>
                    <div class="chart-container"><canvas id="statusChart"></canvas></div>
                </div>
                <div class="chart-box">
                    <h3>Voltage Levels</h3>
                    <div class="chart-container"><canvas id="voltageChart"></canvas></div>
                </div>
                <div class="chart-box">
                    <h3>Fuel Level Over Time</h3>
                    <div class="chart-container"><canvas id="fuelChart"></canvas></div>
                </div>
            </div>

            <h2>Device Status</h2>
            <div class="switches">
                <div class="switch-card">
                    <div class="label">Pump Switch</div>
                    <div class="state" id="pumpState">OFF</div>
                </div>
                <div class="switch-card">
                    <div class="label">Generator Switch</div>
                    <div class="state" id="generatorState">OFF</div>
                </div>
            </div>

            <h2>Raw Feed Preview</h2>
            <div class="chart-box">
                <table class="preview" id="previewTable"></table>
            </div>
        </main>
    </div>

    <div class="footer"><p>Site Monitoring Dashboard</p></div>

    <script>
        const chartOptions = {
            responsive: true,
            maintainAspectRatio: false,
            animation: false,
            plugins: { legend: { display: false } },
            scales: {
                x: { ticks: { color: '#9aa5ce', maxTicksLimit: 10 }, grid: { color: '#0f3460' } },
                y: { ticks: { color: '#9aa5ce' }, grid: { color: '#0f3460' } }
            }
        };

        function lineChart(id, color, fill) {
            return new Chart(document.getElementById(id), {
                type: 'line',
                data: { labels: [], datasets: [{
                    data: [],
                    borderColor: color,
                    backgroundColor: fill ? color : 'transparent',
                    fill: fill ? 'origin' : false,
                    borderWidth: 2,
                    pointRadius: 0,
                    tension: 0.3
                }] },
                options: chartOptions
            });
        }

        const tempChart = lineChart('tempChart', 'firebrick', false);
        const humidityChart = lineChart('humidityChart', 'royalblue', false);
        const fuelChart = lineChart('fuelChart', 'rgba(34, 197, 94, 0.45)', true);

        const voltageChart = new Chart(document.getElementById('voltageChart'), {
            type: 'bar',
            data: { labels: [], datasets: [{ data: [], backgroundColor: 'indianred' }] },
            options: chartOptions
        });

        const statusChart = new Chart(document.getElementById('statusChart'), {
            type: 'pie',
            data: { labels: [], datasets: [{ data: [], backgroundColor: ['royalblue'] }] },
            options: { responsive: true, maintainAspectRatio: false, animation: false,
                       plugins: { legend: { display: true, labels: { color: '#eee' } } } }
        });

        // half-doughnut gauge: one dataset for the band arcs and the fixed
        // threshold tick, one for the current value
        const gaugeChart = new Chart(document.getElementById('gaugeChart'), {
            type: 'doughnut',
            data: { datasets: [
                { data: [512, 384, 8, 119],
                  backgroundColor: ['lightgray', 'gray', 'red', 'gray'],
                  borderWidth: 0, weight: 0.35 },
                { data: [0, 1023],
                  backgroundColor: ['darkblue', '#0f3460'],
                  borderWidth: 0 }
            ] },
            options: { responsive: true, maintainAspectRatio: false, animation: false,
                       rotation: -90, circumference: 180, cutout: '65%',
                       plugins: { legend: { display: false }, tooltip: { enabled: false } } }
        });

        function setSeries(chart, series) {
            chart.data.labels = series ? series.labels : [];
            chart.data.datasets[0].data = series ? series.values : [];
            chart.update();
        }

        function renderMetrics(metrics) {
            const cards = document.getElementById('metricCards');
            cards.innerHTML = '';
            for (const m of metrics) {
                const card = document.createElement('div');
                card.className = 'card';
                const delta = m.delta
                    ? '<div class="delta ' + (m.delta.inverse ? 'inverse' : 'plain') + '">' + m.delta.reference + '</div>'
                    : '';
                card.innerHTML = '<div class="label">' + m.label + '</div>'
                    + '<div class="value">' + m.value + '</div>' + delta;
                cards.appendChild(card);
            }
        }

        function renderGauge(gauge) {
            if (!gauge) {
                document.getElementById('gaugeValue').textContent = '-';
                document.getElementById('gaugeDelta').textContent = '';
                return;
            }
            gaugeChart.data.datasets[1].data = [gauge.value, gauge.max - gauge.value];
            gaugeChart.data.datasets[1].backgroundColor[0] =
                gauge.band === 'elevated' ? 'indianred' : 'darkblue';
            gaugeChart.update();
            document.getElementById('gaugeValue').textContent = gauge.value;
            const delta = document.getElementById('gaugeDelta');
            delta.textContent = (gauge.delta >= 0 ? '+' : '') + gauge.delta + ' vs ' + gauge.reference;
            delta.style.color = gauge.delta >= 0 ? '#4ade80' : '#f87171';
        }

        function renderPreview(rows) {
            const table = document.getElementById('previewTable');
            if (!rows || rows.length === 0) { table.innerHTML = ''; return; }
            let html = '<tr><th>timestamp</th><th>site</th><th>door</th><th>temp</th><th>hum</th>'
                + '<th>fuel</th><th>gauge</th><th>soil</th><th>voltages</th></tr>';
            for (const r of rows) {
                html += '<tr><td>' + r.last_reading_time + '</td><td>' + r.site_status + '</td>'
                    + '<td>' + r.door_status + '</td><td>' + r.temperature + '</td>'
                    + '<td>' + r.humidity + '</td><td>' + r.fuel_level + '</td>'
                    + '<td>' + r.gauge_value + '</td><td>' + r.soil_moisture + '</td>'
                    + '<td>' + r.voltages.join(' / ') + '</td></tr>';
            }
            table.innerHTML = html;
        }

        function syncControls(controls) {
            document.getElementById('pumpToggle').checked = controls.pump_on;
            document.getElementById('generatorToggle').checked = controls.generator_on;
            document.getElementById('featureToggle').checked = controls.feature_on;
            document.getElementById('pumpSeconds').value = controls.pump_seconds;
            document.getElementById('pumpSecondsValue').textContent = controls.pump_seconds;
            document.getElementById('displayMode').value = controls.display_mode;
        }

        function render(model) {
            document.getElementById('staleBanner').style.display = model.stale ? 'block' : 'none';
            const nodata = document.getElementById('nodataBanner');
            if (!model.data_available) {
                nodata.textContent = 'No data available' + (model.error ? ': ' + model.error : '.');
                nodata.style.display = 'block';
            } else {
                nodata.style.display = 'none';
            }
            const feature = document.getElementById('featureBanner');
            feature.textContent = model.feature_banner || '';
            feature.style.display = model.feature_banner ? 'block' : 'none';

            renderMetrics(model.metrics);
            renderGauge(model.gauge);
            setSeries(tempChart, model.temperature_chart);
            setSeries(humidityChart, model.humidity_chart);
            setSeries(fuelChart, model.fuel_chart);
            setSeries(voltageChart, model.voltage_chart);
            if (model.status_chart) {
                statusChart.data.labels = model.status_chart.labels;
                statusChart.data.datasets[0].data = model.status_chart.values;
                statusChart.update();
            }

            const pump = document.getElementById('pumpState');
            pump.textContent = model.switches.pump;
            pump.className = 'state' + (model.switches.pump === 'ON' ? ' on' : '');
            const generator = document.getElementById('generatorState');
            generator.textContent = model.switches.generator;
            generator.className = 'state' + (model.switches.generator === 'ON' ? ' on' : '');

            renderPreview(model.preview);
            syncControls(model.controls);
        }

        let refreshTimer = null;

        async function refresh() {
            try {
                const response = await fetch('/api/dashboard');
                const model = await response.json();
                render(model);
                if (refreshTimer === null) {
                    refreshTimer = setInterval(refresh, model.refresh_ms);
                }
            } catch (e) {
                document.getElementById('nodataBanner').style.display = 'block';
            }
        }

        async function postControls(update) {
            try {
                await fetch('/api/controls', {
                    method: 'POST',
                    headers: { 'Content-Type': 'application/json' },
                    body: JSON.stringify(update)
                });
                await refresh();
            } catch (e) { /* next timer tick retries */ }
        }

        document.getElementById('pumpToggle').addEventListener('change', e =>
            postControls({ pump_on: e.target.checked }));
        document.getElementById('generatorToggle').addEventListener('change', e =>
            postControls({ generator_on: e.target.checked }));
        document.getElementById('featureToggle').addEventListener('change', e =>
            postControls({ feature_on: e.target.checked }));
        document.getElementById('displayMode').addEventListener('change', e =>
            postControls({ display_mode: e.target.value }));
        document.getElementById('pumpSeconds').addEventListener('input', e =>
            document.getElementById('pumpSecondsValue').textContent = e.target.value);
        document.getElementById('pumpSeconds').addEventListener('change', e =>
            postControls({ pump_seconds: parseInt(e.target.value, 10) }));
        document.getElementById('resetSlave').addEventListener('click', () =>
            fetch('/api/reset', { method: 'POST' }).then(refresh));

        refresh();
    </script>
</body>
</html>
"##;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_wires_every_widget_and_endpoint() {
        for needle in [
            "gaugeChart",
            "tempChart",
            "humidityChart",
            "voltageChart",
            "statusChart",
            "fuelChart",
            "/api/dashboard",
            "/api/controls",
            "/api/reset",
            "Pump Toggle",
            "Generator Toggle",
            "Reset Slave",
        ] {
            assert!(DASHBOARD_HTML.contains(needle), "page is missing '{needle}'");
        }
    }

    #[test]
    fn pump_slider_matches_the_clamp_range() {
        assert!(DASHBOARD_HTML.contains(r#"min="0" max="60""#));
    }
}
