mod telemetry;

use chrono::Utc;
use clap::Parser;
use rand::Rng;
use rumqttc::{AsyncClient, MqttOptions, QoS};
use std::time::Duration;
use telemetry::{CowTelemetry, HOME_AREA, OUTSIDE_AREA};
use tracing::{error, info, warn};

/// Small jitter around the pasture center, roughly 100 m.
const OFFSET_NORMAL: f64 = 0.001;
/// Offset that puts an animal far outside any reasonable geofence.
const OFFSET_GEOFENCE_BREACH: f64 = 0.5;

/// Publishes simulated herd telemetry with forced alert scenarios.
#[derive(Debug, Parser)]
#[command(name = "simulator", version)]
struct Args {
    #[arg(long, env = "MQTT_BROKER", default_value = "localhost")]
    broker: String,

    #[arg(long, env = "MQTT_PORT", default_value_t = 1883)]
    port: u16,

    #[arg(long, env = "MQTT_TOPIC", default_value = "vaca/telemetria")]
    topic: String,

    /// Seconds between two reports of the whole herd
    #[arg(long, env = "INTERVAL_SECS", default_value_t = 15)]
    interval_secs: u64,

    #[arg(long, env = "HERD", value_delimiter = ',', default_value = "V1,V2,V3,V4")]
    herd: Vec<String>,

    #[arg(long, env = "CENTER_LAT", default_value_t = 20.734503, allow_negative_numbers = true)]
    center_lat: f64,

    #[arg(long, env = "CENTER_LNG", default_value_t = -103.455896, allow_negative_numbers = true)]
    center_lng: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scenario {
    Normal,
    Fever,
    GeofenceExit,
    LowPulse,
}

fn scenario_for(id_vaca: &str) -> Scenario {
    match id_vaca {
        "V2" => Scenario::Fever,
        "V3" => Scenario::GeofenceExit,
        "V4" => Scenario::LowPulse,
        _ => Scenario::Normal,
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Initialize logging
    tracing_subscriber::fmt::init();

    info!("Starting herd simulator");
    info!(
        "Broker: {}:{}, topic: {}, herd: {:?}, interval: {}s",
        args.broker, args.port, args.topic, args.herd, args.interval_secs
    );

    let client_id = format!("herd-sim-{}", uuid::Uuid::new_v4());

    let mut mqtt_options = MqttOptions::new(client_id, &args.broker, args.port);
    mqtt_options.set_keep_alive(Duration::from_secs(60));
    mqtt_options.set_clean_session(true);

    let (client, mut eventloop) = AsyncClient::new(mqtt_options, 100);

    // Spawn eventloop handler
    tokio::spawn(async move {
        loop {
            if let Err(e) = eventloop.poll().await {
                error!("MQTT eventloop error: {}", e);
                tokio::time::sleep(Duration::from_secs(1)).await;
            }
        }
    });

    let center = (args.center_lat, args.center_lng);
    let mut ticker = tokio::time::interval(Duration::from_secs(args.interval_secs.max(1)));

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                info!("Simulation stopped");
                break;
            }
        }

        let readings: Vec<CowTelemetry> = {
            let mut rng = rand::thread_rng();
            args.herd
                .iter()
                .map(|id| generate_telemetry(&mut rng, id, center))
                .collect()
        };

        for reading in readings {
            let payload = match serde_json::to_string(&reading) {
                Ok(p) => p,
                Err(e) => {
                    error!("Failed to serialize telemetry: {}", e);
                    continue;
                }
            };

            if let Err(e) = client
                .publish(&args.topic, QoS::AtLeastOnce, false, payload)
                .await
            {
                warn!("Failed to publish reading for {}: {}", reading.id_vaca, e);
                continue;
            }

            if reading.is_alerting() {
                warn!(
                    "[ALERT] {}: temp={} pulse={} lat={:.4} area={}",
                    reading.id_vaca, reading.temperatura, reading.pulso, reading.lat, reading.area
                );
            } else {
                info!(
                    "[OK] {}: temp={} pulse={} lat={:.4}",
                    reading.id_vaca, reading.temperatura, reading.pulso, reading.lat
                );
            }
        }
    }

    if let Err(e) = client.disconnect().await {
        warn!("Failed to disconnect cleanly: {}", e);
    }
}

fn generate_telemetry(rng: &mut impl Rng, id_vaca: &str, center: (f64, f64)) -> CowTelemetry {
    let (center_lat, center_lng) = center;

    let mut lat = center_lat + rng.gen_range(-OFFSET_NORMAL..OFFSET_NORMAL);
    let mut lng = center_lng + rng.gen_range(-OFFSET_NORMAL..OFFSET_NORMAL);
    let mut temperatura: f64 = 38.5 + rng.gen_range(-0.3..0.3);
    let mut pulso = rng.gen_range(65..=75);
    let mut riesgo = false;
    let mut area = HOME_AREA;

    match scenario_for(id_vaca) {
        Scenario::Normal => {}
        Scenario::Fever => {
            temperatura = 39.8 + rng.gen_range(0.1..0.2);
            pulso = 88;
            riesgo = true;
        }
        Scenario::GeofenceExit => {
            lat = center_lat + OFFSET_GEOFENCE_BREACH;
            lng = center_lng - OFFSET_GEOFENCE_BREACH;
            area = OUTSIDE_AREA;
        }
        Scenario::LowPulse => {
            pulso = 45;
            riesgo = true;
        }
    }

    CowTelemetry {
        id_vaca: id_vaca.to_string(),
        timestamp: Utc::now(),
        lat,
        lng,
        area: area.to_string(),
        temperatura: (temperatura * 100.0).round() / 100.0,
        pulso,
        riesgo,
    }
}
