use std::time::Duration;

use curtain_api::SensorData;
use curtain_api::topics::SENSOR_DATA;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};

use crate::configs::Sensor;
use crate::services::event_bus::EventBus;

/// Bounded random walk that reverses direction at either bound.
pub struct LightWalk<R: Rng = StdRng> {
    value: i32,
    direction: i32,
    min: i32,
    max: i32,
    max_step: i32,
    rng: R,
}

impl LightWalk<StdRng> {
    pub fn new(sensor: &Sensor) -> Self {
        Self::with_rng(sensor, StdRng::from_os_rng())
    }
}

impl<R: Rng> LightWalk<R> {
    pub fn with_rng(sensor: &Sensor, rng: R) -> Self {
        Self {
            value: sensor.initial_value.clamp(sensor.min_value, sensor.max_value),
            direction: 1,
            min: sensor.min_value,
            max: sensor.max_value,
            max_step: sensor.max_step,
            rng,
        }
    }

    pub fn next_value(&mut self) -> i32 {
        self.value += self.direction * self.rng.random_range(0..self.max_step);

        if self.value >= self.max {
            self.value = self.max;
            self.direction = -1;
        } else if self.value <= self.min {
            self.value = self.min;
            self.direction = 1;
        }

        self.value
    }
}

/// Sensing unit: publishes one light reading per period on `sensor/data`.
pub struct LightSensor {
    walk: LightWalk,
    event_bus: EventBus,
    interval: Duration,
}

impl LightSensor {
    pub fn new(sensor: &Sensor, event_bus: EventBus) -> Self {
        Self {
            walk: LightWalk::new(sensor),
            event_bus,
            interval: sensor.interval(),
        }
    }

    pub fn start(mut self) -> JoinHandle<()> {
        tracing::info!("Sensor publishing light data every {:?}", self.interval);

        tokio::spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + self.interval, self.interval);
            loop {
                ticker.tick().await;

                let data = SensorData::light(self.walk.next_value());
                match self.event_bus.publish_json(SENSOR_DATA, &data).await {
                    Ok(_) => tracing::debug!("Published light data {}", data.value),
                    Err(e) => tracing::warn!("Dropped light data {}: {}", data.value, e),
                }
            }
        })
    }
}
