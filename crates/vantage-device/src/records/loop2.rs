//! LOOP2: the extended realtime packet, answered to `LPS 2 1`.
//!
//! Shares the LOOP1 header layout; adds derived temperatures, wind
//! averages, recent-interval rain counters and the barometric calibration
//! block, and replaces the alarm/forecast tail with graph pointers.

use vantage_schema::{CopySpec, FieldSpec, Schema, Transform};

pub(super) fn schema() -> Schema {
    Schema::new()
        .field("package_type", FieldSpec::u8(4.0))
        .object("pressure", pressure())
        .object("temperature", temperature())
        .object("humidity", humidity())
        .object("wind", wind())
        .field("dew_point", FieldSpec::i16(30.0).nullable(255))
        .field("heat_index", FieldSpec::i16(35.0).nullable(255))
        .field("wind_chill", FieldSpec::i16(37.0).nullable(255))
        .field("thsw", FieldSpec::i16(39.0).nullable(255))
        .object("rain", rain())
        .object("et", et())
        .field(
            "uv",
            FieldSpec::u8(43.0).nullable(255).transform(Transform::Scale(0.1)),
        )
        .field("solar_radiation", FieldSpec::u16(44.0).nullable(32767))
        .object("graph_pointers", graph_pointers())
}

fn pressure() -> Schema {
    let thousandths = |position: f64| {
        FieldSpec::u16(position)
            .nullable(0)
            .transform(Transform::Scale(0.001))
            .transform(Transform::Round(3))
    };
    Schema::new()
        .field("trend", FieldSpec::i8(3.0).nullable(80))
        .field("current", thousandths(7.0))
        .copy("current_raw", CopySpec::of("current").nullable(0))
        .field("reduction_method", FieldSpec::u8(60.0))
        .field(
            "user_offset",
            FieldSpec::i16(61.0).transform(Transform::Scale(0.001)),
        )
        .field(
            "calibration_offset",
            FieldSpec::i16(63.0).transform(Transform::Scale(0.001)),
        )
        .field("sensor_raw", thousandths(65.0))
        .field("absolute", thousandths(67.0))
        .field("altimeter", thousandths(69.0))
}

fn temperature() -> Schema {
    let tenths = |position: f64| {
        FieldSpec::i16(position)
            .nullable(32767)
            .transform(Transform::Scale(0.1))
            .transform(Transform::Round(1))
    };
    Schema::new()
        .field("in", tenths(9.0))
        .field("out", tenths(12.0))
}

fn humidity() -> Schema {
    Schema::new()
        .field("in", FieldSpec::u8(11.0).nullable(255))
        .field("out", FieldSpec::u8(33.0).nullable(255))
}

fn wind() -> Schema {
    let tenths = |position: f64| {
        FieldSpec::u16(position)
            .nullable(32767)
            .transform(Transform::Scale(0.1))
            .transform(Transform::Round(1))
    };
    Schema::new()
        .field("current", FieldSpec::u8(14.0).nullable(255))
        .field("direction", FieldSpec::u16(16.0).nullable(0))
        .field("avg_10min", tenths(18.0))
        .field("avg_2min", tenths(20.0))
        .object(
            "gust",
            Schema::new()
                .field("speed", tenths(22.0))
                .field("direction", FieldSpec::u16(24.0).nullable(0)),
        )
}

fn rain() -> Schema {
    let clicks = |position: f64| {
        FieldSpec::u16(position)
            .transform(Transform::Scale(0.01))
            .transform(Transform::Round(2))
    };
    Schema::new()
        .field("rate", clicks(41.0))
        .field("storm", clicks(46.0).nullable(0xFFFF))
        .field(
            "storm_start",
            FieldSpec::u16(48.0)
                .nullables(&[0xFFFF, 0])
                .transform(Transform::StormDate)
                .depends_on("storm"),
        )
        .field("day", clicks(50.0))
        .field("last_15min", clicks(52.0))
        .field("last_hour", clicks(54.0))
        .field("last_24h", clicks(58.0))
}

fn et() -> Schema {
    Schema::new().field(
        "day",
        FieldSpec::u16(56.0)
            .nullable(65535)
            .transform(Transform::Scale(0.001))
            .transform(Transform::Round(3)),
    )
}

fn graph_pointers() -> Schema {
    Schema::new()
        .field("next_10min_wind_speed", FieldSpec::u8(73.0))
        .field("next_15min_wind_speed", FieldSpec::u8(74.0))
        .field("next_hourly_wind_speed", FieldSpec::u8(75.0))
        .field("next_daily_wind_speed", FieldSpec::u8(76.0))
        .field("next_minute_rain", FieldSpec::u8(77.0))
        .field("next_rain_storm", FieldSpec::u8(78.0))
        .field("minute_in_hour", FieldSpec::u8(79.0))
        .field("next_monthly_rain", FieldSpec::u8(80.0))
        .field("next_yearly_rain", FieldSpec::u8(81.0))
        .field("next_seasonal_rain", FieldSpec::u8(82.0))
}
