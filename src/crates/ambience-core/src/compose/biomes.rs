//! Per-biome composition rules
//!
//! Each biome owns its palette and constants. Layers are pushed bed first,
//! then weather, then accents.

use super::{rain_asset, thunder_asset, Environment, ACCENT_FADE, BASE_FADE, WEATHER_FADE};
use crate::{SoundLayer, TimeOfDay};

pub(crate) fn city(env: &Environment) -> Vec<SoundLayer> {
    let w = env.wind;
    let wx = env.weather;
    let mut layers = Vec::new();

    if env.time == TimeOfDay::Night {
        layers.push(SoundLayer::base("city-night", 0.4).fade_in(BASE_FADE));
    } else {
        layers.push(SoundLayer::base("city-ambience", 0.5).fade_in(BASE_FADE));
    }
    let traffic = match env.time {
        TimeOfDay::Day => 0.35,
        TimeOfDay::Evening => 0.3,
        TimeOfDay::Night => 0.15,
    };
    layers.push(SoundLayer::base("traffic", traffic).fade_in(BASE_FADE));
    layers.push(SoundLayer::base("wind-light", (0.5 * w).min(0.6)).fade_in(BASE_FADE));

    if wx.snow {
        layers.push(SoundLayer::weather("snowfall", 0.25).fade_in(WEATHER_FADE));
    } else if wx.rain > 0.0 {
        layers.push(SoundLayer::weather("rain-urban", 0.25 + 0.5 * wx.rain).fade_in(WEATHER_FADE));
    }
    if wx.thunder > 0.0 {
        layers.push(
            SoundLayer::weather("thunder-distant", 0.3 + 0.4 * wx.thunder)
                .fade_in(WEATHER_FADE)
                .delay(2.0),
        );
    }

    if env.is_day() && env.draws.birds {
        layers.push(SoundLayer::accent("birds", 0.15).fade_in(ACCENT_FADE).delay(4.0));
    }

    layers
}

pub(crate) fn forest(env: &Environment) -> Vec<SoundLayer> {
    let w = env.wind;
    let wx = env.weather;
    let mut layers = vec![
        SoundLayer::base("forest-ambience", 0.5).fade_in(BASE_FADE),
        SoundLayer::base("wind-trees", (0.2 + 0.5 * w).min(0.8)).fade_in(BASE_FADE),
    ];
    // Birds go quiet once the rain gets going.
    if env.is_day() && wx.rain < 0.5 {
        layers.push(SoundLayer::base("forest-birds", 0.4).fade_in(BASE_FADE));
    }

    if wx.snow {
        layers.push(SoundLayer::weather("snowfall", 0.3).fade_in(WEATHER_FADE));
    } else if wx.rain > 0.0 {
        layers.push(SoundLayer::weather("rain-canopy", (0.3 + 0.6 * wx.rain).min(0.9)).fade_in(WEATHER_FADE));
    }
    if wx.thunder > 0.0 {
        layers.push(
            SoundLayer::weather(thunder_asset(wx.thunder), 0.7 * wx.thunder)
                .fade_in(WEATHER_FADE)
                .delay(1.5),
        );
    }

    if env.time == TimeOfDay::Night {
        layers.push(SoundLayer::accent("owl", 0.25).fade_in(ACCENT_FADE).delay(6.0));
    }
    if env.is_day() && env.draws.birds {
        layers.push(SoundLayer::accent("birds", 0.25).fade_in(ACCENT_FADE).delay(3.0));
    }
    if env.is_dark() && env.draws.crickets {
        layers.push(SoundLayer::accent("crickets", 0.3).fade_in(ACCENT_FADE).delay(2.0));
    }
    if env.is_dark() && env.draws.frogs {
        layers.push(SoundLayer::accent("frogs", 0.2).fade_in(ACCENT_FADE).delay(5.0));
    }

    layers
}

pub(crate) fn field(env: &Environment) -> Vec<SoundLayer> {
    let w = env.wind;
    let wx = env.weather;
    let mut layers = vec![
        SoundLayer::base("wind-grass", (0.25 + 0.5 * w).min(0.85)).fade_in(BASE_FADE),
        SoundLayer::base("field-ambience", 0.3).fade_in(BASE_FADE),
    ];

    if wx.snow {
        layers.push(SoundLayer::weather("snowfall", 0.35).fade_in(WEATHER_FADE));
    } else if wx.rain > 0.0 {
        layers.push(SoundLayer::weather(rain_asset(wx.rain), 0.8 * wx.rain).fade_in(WEATHER_FADE));
    }
    if wx.thunder > 0.0 {
        layers.push(
            SoundLayer::weather("thunder-rolling", 0.2 + 0.6 * wx.thunder)
                .fade_in(WEATHER_FADE)
                .delay(2.5),
        );
    }

    if env.is_day() && env.draws.birds {
        layers.push(SoundLayer::accent("birds", 0.3).fade_in(ACCENT_FADE).delay(2.0));
    }
    if env.is_dark() && env.draws.crickets {
        let volume = if env.time == TimeOfDay::Night { 0.45 } else { 0.35 };
        layers.push(SoundLayer::accent("crickets", volume).fade_in(ACCENT_FADE).delay(1.0));
    }
    if env.is_dark() && env.draws.frogs {
        layers.push(SoundLayer::accent("frogs", 0.2).fade_in(ACCENT_FADE).delay(4.0));
    }

    layers
}

pub(crate) fn beach(env: &Environment) -> Vec<SoundLayer> {
    let w = env.wind;
    let wx = env.weather;
    let mut layers = vec![
        SoundLayer::base("beach-waves", (0.55 + 0.25 * w).min(1.0)).fade_in(BASE_FADE),
        SoundLayer::base("wind-coastal", 0.2 + 0.4 * w).fade_in(BASE_FADE),
    ];
    if env.is_day() && wx.rain < 0.7 {
        layers.push(SoundLayer::accent("seagulls", 0.2).fade_in(ACCENT_FADE).delay(3.0));
    }

    if wx.snow {
        layers.push(SoundLayer::weather("snowfall", 0.2).fade_in(WEATHER_FADE));
    } else if wx.rain > 0.0 {
        layers.push(SoundLayer::weather(rain_asset(wx.rain), 0.6 * wx.rain).fade_in(WEATHER_FADE));
    }
    if wx.thunder > 0.0 {
        layers.push(
            SoundLayer::weather("thunder-distant", 0.5 * wx.thunder)
                .fade_in(WEATHER_FADE)
                .delay(3.0),
        );
    }

    if env.is_dark() && env.draws.crickets {
        layers.push(SoundLayer::accent("crickets", 0.15).fade_in(ACCENT_FADE).delay(2.0));
    }

    layers
}

pub(crate) fn lake(env: &Environment) -> Vec<SoundLayer> {
    let w = env.wind;
    let wx = env.weather;
    let mut layers = vec![
        SoundLayer::base("lake-lapping", 0.45).fade_in(BASE_FADE),
        SoundLayer::base("wind-light", (0.45 * w).max(0.15)).fade_in(BASE_FADE),
    ];

    if wx.snow {
        layers.push(SoundLayer::weather("snowfall", 0.3).fade_in(WEATHER_FADE));
    } else if wx.rain > 0.0 {
        layers.push(SoundLayer::weather("rain-on-water", 0.2 + 0.6 * wx.rain).fade_in(WEATHER_FADE));
    }
    if wx.thunder > 0.0 {
        layers.push(
            SoundLayer::weather("thunder-distant", 0.6 * wx.thunder)
                .fade_in(WEATHER_FADE)
                .delay(2.0),
        );
    }
    if wx.fog {
        layers.push(SoundLayer::weather("foghorn", 0.12).fade_in(WEATHER_FADE).delay(8.0));
    }

    if env.is_day() && env.draws.birds {
        layers.push(SoundLayer::accent("birds", 0.25).fade_in(ACCENT_FADE).delay(2.0));
    }
    if env.is_dark() && env.draws.crickets {
        layers.push(SoundLayer::accent("crickets", 0.25).fade_in(ACCENT_FADE).delay(3.0));
    }
    if env.is_dark() && env.draws.frogs {
        layers.push(SoundLayer::accent("frogs", 0.35).fade_in(ACCENT_FADE).delay(1.0));
    }

    layers
}

pub(crate) fn ocean(env: &Environment) -> Vec<SoundLayer> {
    let w = env.wind;
    let wx = env.weather;
    let mut layers = vec![
        SoundLayer::base("ocean-waves", (0.5 + 0.3 * w).min(1.0)).fade_in(BASE_FADE),
        SoundLayer::base("ocean-deep", 0.35).fade_in(BASE_FADE),
        SoundLayer::base("wind-coastal", (0.3 + 0.5 * w).min(1.0)).fade_in(BASE_FADE),
    ];

    if wx.snow {
        layers.push(SoundLayer::weather("snowfall", 0.15).fade_in(WEATHER_FADE));
    } else if wx.rain > 0.0 {
        layers.push(SoundLayer::weather(rain_asset(wx.rain), 0.5 * wx.rain).fade_in(WEATHER_FADE));
    }
    if wx.thunder > 0.0 {
        layers.push(
            SoundLayer::weather(thunder_asset(wx.thunder), 0.8 * wx.thunder)
                .fade_in(WEATHER_FADE)
                .delay(1.0),
        );
    }
    if wx.fog {
        layers.push(SoundLayer::weather("foghorn", 0.2).fade_in(WEATHER_FADE).delay(5.0));
    }

    if env.is_day() && env.draws.birds {
        layers.push(SoundLayer::accent("seagulls", 0.2).fade_in(ACCENT_FADE).delay(4.0));
    }

    layers
}

pub(crate) fn desert(env: &Environment) -> Vec<SoundLayer> {
    let w = env.wind;
    let wx = env.weather;
    let mut layers = vec![
        SoundLayer::base("wind-desert", (0.3 + 0.5 * w).min(0.9)).fade_in(BASE_FADE),
        SoundLayer::base("wind-desert-gusts", (0.7 * w).max(0.1)).fade_in(BASE_FADE),
    ];

    // Snow and rain alike only ever reach the desert as a light patter.
    if wx.rain > 0.0 {
        layers.push(SoundLayer::weather("rain-light", 0.5 * wx.rain).fade_in(WEATHER_FADE));
    }
    if wx.thunder > 0.0 {
        layers.push(
            SoundLayer::weather("thunder-distant", 0.4 * wx.thunder)
                .fade_in(WEATHER_FADE)
                .delay(3.0),
        );
    }

    if env.time == TimeOfDay::Night && env.draws.crickets {
        layers.push(SoundLayer::accent("crickets", 0.2).fade_in(ACCENT_FADE).delay(2.0));
    }

    layers
}
