//! LOOP1: the original realtime packet, answered to `LPS 1 1`.

use vantage_schema::{ArrayKind, CopySpec, FieldSpec, Schema, SchemaNode, Transform};

/// Raw console battery counts → volts.
const BATTERY_VOLTS: f64 = 300.0 / 512.0 / 100.0;

pub(super) fn schema() -> Schema {
    Schema::new()
        .field("package_type", FieldSpec::u8(4.0))
        .field("next_archive_record", FieldSpec::u16(5.0))
        .object("pressure", pressure())
        .object("temperature", temperature())
        .object("humidity", humidity())
        .object("wind", wind())
        .object("rain", rain())
        .object("et", et())
        .field(
            "uv",
            FieldSpec::u8(43.0).nullable(255).transform(Transform::Scale(0.1)),
        )
        .field("solar_radiation", FieldSpec::u16(44.0).nullable(32767))
        .array(
            "soil_moisture",
            SchemaNode::Field(FieldSpec::u8(62.0).nullable(255)),
            4,
            ArrayKind::PropertyBased,
        )
        .array(
            "leaf_wetness",
            SchemaNode::Field(FieldSpec::u8(66.0).nullable(255)),
            4,
            ArrayKind::PropertyBased,
        )
        .object("alarms", alarms())
        .object("battery", battery())
        .object("forecast", forecast())
        .object("sun", sun())
}

fn pressure() -> Schema {
    Schema::new()
        // 'P' when the firmware cannot determine a trend.
        .field("trend", FieldSpec::i8(3.0).nullable(80))
        .field(
            "current",
            FieldSpec::u16(7.0)
                .nullable(0)
                .transform(Transform::Scale(0.001))
                .transform(Transform::Round(3)),
        )
        .copy("current_raw", CopySpec::of("current").nullable(0))
}

fn temperature() -> Schema {
    let biased = |position: f64| {
        FieldSpec::u8(position)
            .nullable(255)
            .transform(Transform::Offset(-90.0))
    };
    Schema::new()
        .field(
            "in",
            FieldSpec::i16(9.0)
                .nullable(32767)
                .transform(Transform::Scale(0.1))
                .transform(Transform::Round(1)),
        )
        .field(
            "out",
            FieldSpec::i16(12.0)
                .nullable(32767)
                .transform(Transform::Scale(0.1))
                .transform(Transform::Round(1)),
        )
        .array(
            "extra",
            SchemaNode::Field(biased(18.0)),
            7,
            ArrayKind::PropertyBased,
        )
        .array(
            "soil",
            SchemaNode::Field(biased(25.0)),
            4,
            ArrayKind::PropertyBased,
        )
        .array(
            "leaf",
            SchemaNode::Field(biased(29.0)),
            4,
            ArrayKind::PropertyBased,
        )
}

fn humidity() -> Schema {
    Schema::new()
        .field("in", FieldSpec::u8(11.0).nullable(255))
        .field("out", FieldSpec::u8(33.0).nullable(255))
        .array(
            "extra",
            SchemaNode::Field(FieldSpec::u8(34.0).nullable(255)),
            7,
            ArrayKind::PropertyBased,
        )
}

fn wind() -> Schema {
    Schema::new()
        .field("current", FieldSpec::u8(14.0).nullable(255))
        .field("avg_10min", FieldSpec::u8(15.0).nullable(255))
        // 1–360; 0 means no reading.
        .field("direction", FieldSpec::u16(16.0).nullable(0))
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
        .field("month", clicks(52.0))
        .field("year", clicks(54.0))
}

fn et() -> Schema {
    Schema::new()
        .field(
            "day",
            FieldSpec::u16(56.0)
                .nullable(65535)
                .transform(Transform::Scale(0.001))
                .transform(Transform::Round(3)),
        )
        .field(
            "month",
            FieldSpec::u16(58.0)
                .nullable(65535)
                .transform(Transform::Scale(0.01))
                .transform(Transform::Round(2)),
        )
        .field(
            "year",
            FieldSpec::u16(60.0)
                .nullable(65535)
                .transform(Transform::Scale(0.01))
                .transform(Transform::Round(2)),
        )
}

fn alarms() -> Schema {
    Schema::new()
        .field("falling_bar_trend", FieldSpec::bit(70.0))
        .field("rising_bar_trend", FieldSpec::bit(70.125))
        .field("low_inside_temp", FieldSpec::bit(70.25))
        .field("high_inside_temp", FieldSpec::bit(70.375))
        .field("low_inside_humidity", FieldSpec::bit(70.5))
        .field("high_inside_humidity", FieldSpec::bit(70.625))
        .field("time", FieldSpec::bit(70.75))
        .field("high_rain_rate", FieldSpec::bit(71.0))
        .field("flash_flood", FieldSpec::bit(71.125))
        .field("daily_rain", FieldSpec::bit(71.25))
        .field("storm_total_rain", FieldSpec::bit(71.375))
        .field("daily_et", FieldSpec::bit(71.5))
        .field("low_outside_temp", FieldSpec::bit(72.0))
        .field("high_outside_temp", FieldSpec::bit(72.125))
        .field("wind_speed", FieldSpec::bit(72.25))
        .field("ten_min_avg_wind", FieldSpec::bit(72.375))
        .field("low_dew_point", FieldSpec::bit(72.5))
        .field("high_dew_point", FieldSpec::bit(72.625))
        .field("high_heat_index", FieldSpec::bit(72.75))
        .field("low_wind_chill", FieldSpec::bit(72.875))
        .field("high_thsw", FieldSpec::bit(73.0))
        .field("high_solar", FieldSpec::bit(73.125))
        .field("high_uv", FieldSpec::bit(73.25))
        .field("low_outside_humidity", FieldSpec::bit(74.0))
        .field("high_outside_humidity", FieldSpec::bit(74.125))
}

fn battery() -> Schema {
    Schema::new()
        .field("transmitter_status", FieldSpec::u8(86.0))
        .field(
            "console_voltage",
            FieldSpec::u16(87.0)
                .transform(Transform::Scale(BATTERY_VOLTS))
                .transform(Transform::Round(2)),
        )
}

fn forecast() -> Schema {
    Schema::new()
        .field("icons", FieldSpec::u8(89.0))
        .field("rule", FieldSpec::u8(90.0))
}

fn sun() -> Schema {
    Schema::new()
        .field(
            "sunrise",
            FieldSpec::u16(91.0)
                .nullable(65535)
                .transform(Transform::TimeOfDay),
        )
        .field(
            "sunset",
            FieldSpec::u16(93.0)
                .nullable(65535)
                .transform(Transform::TimeOfDay),
        )
}
