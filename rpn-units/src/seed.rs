//! Compiled-in seed tables
//!
//! Dimensions, unit definitions and the sparse set of direct factors the
//! builder closes over. Factors read "one `from` is `factor` `to`s".

use crate::unit::UnitDefinition;
use crate::{ConversionGraphBuilder, DimensionRegistry, NonlinearFn, UnitCatalog};
use rpn_core::{Number, RpnError};

struct SeedTable {
    dimensions: DimensionRegistry,
    catalog: UnitCatalog,
    edges: Vec<(&'static str, &'static str, &'static str)>,
}

/// Builder loaded with the standard dimensions, units and factors
pub fn standard_builder() -> Result<ConversionGraphBuilder, RpnError> {
    let mut table = SeedTable {
        dimensions: DimensionRegistry::new(),
        catalog: UnitCatalog::new(),
        edges: Vec::new(),
    };
    table.seed_dimensions()?;
    table.seed_units();

    let mut builder = ConversionGraphBuilder::new(table.dimensions, table.catalog);
    for (from, to, factor) in table.edges {
        builder.seed(from, to, factor);
    }
    for (from, to, convert) in standard_nonlinear() {
        builder.nonlinear(from, to, convert);
    }
    Ok(builder)
}

impl SeedTable {
    fn unit(&mut self, name: &str, def: UnitDefinition) {
        self.catalog.insert(name, def);
    }

    fn edge(&mut self, from: &'static str, to: &'static str, factor: &'static str) {
        self.edges.push((from, to, factor));
    }

    fn seed_dimensions(&mut self) -> Result<(), RpnError> {
        let dims = &mut self.dimensions;
        dims.register_primitive("length", "meter");
        dims.register_primitive("mass", "kilogram");
        dims.register_primitive("time", "second");
        dims.register_primitive("current", "ampere");
        dims.register_primitive("temperature", "kelvin");
        dims.register_primitive("angle", "radian");
        dims.register_primitive("luminous_intensity", "candela");
        dims.register_primitive("amount_of_substance", "mole");
        dims.register_primitive("information", "bit");

        dims.register_derived("constant", "", "unity")?;
        dims.register_derived("area", "length^2", "square_meter")?;
        dims.register_derived("volume", "length^3", "cubic_meter")?;
        dims.register_derived("velocity", "length/time", "meter_per_second")?;
        dims.register_derived("acceleration", "length/time^2", "meter_per_second_squared")?;
        dims.register_derived("force", "length*mass/time^2", "newton")?;
        dims.register_derived("energy", "length^2*mass/time^2", "joule")?;
        dims.register_derived("power", "length^2*mass/time^3", "watt")?;
        dims.register_derived("pressure", "mass/length*time^2", "pascal")?;
        dims.register_derived("frequency", "1/time", "hertz")?;
        dims.register_derived("charge", "current*time", "coulomb")?;
        dims.register_derived("electric_potential", "length^2*mass/current*time^3", "volt")?;
        dims.register_derived("resistance", "length^2*mass/current^2*time^3", "ohm")?;
        Ok(())
    }

    fn seed_units(&mut self) {
        self.seed_constant();
        self.seed_length();
        self.seed_mass();
        self.seed_time();
        self.seed_current();
        self.seed_temperature();
        self.seed_angle();
        self.seed_luminosity();
        self.seed_amount();
        self.seed_information();
        self.seed_area();
        self.seed_volume();
        self.seed_velocity();
        self.seed_acceleration();
        self.seed_force();
        self.seed_energy();
        self.seed_power();
        self.seed_pressure();
        self.seed_frequency();
        self.seed_electrical();
    }

    fn seed_constant(&mut self) {
        self.unit("unity", UnitDefinition::new("unity", "constant").plural("unity"));
        self.unit("pair", UnitDefinition::new("pair", "constant"));
        self.unit("dozen", UnitDefinition::new("dozen", "constant").aliases(&["dozens"]));
        self.unit("score", UnitDefinition::new("score", "constant"));
        self.unit("gross", UnitDefinition::new("gross", "constant").plural("gross"));
        self.unit("hundred", UnitDefinition::new("hundred", "constant"));
        self.unit("thousand", UnitDefinition::new("thousand", "constant"));
        self.unit("million", UnitDefinition::new("million", "constant"));
        self.unit("billion", UnitDefinition::new("billion", "constant"));
        self.unit("percent", UnitDefinition::new("percent", "constant").plural("percent").abbrev("%"));
        self.unit("permille", UnitDefinition::new("permille", "constant").plural("permille"));
        self.unit("ppm", UnitDefinition::new("ppm", "constant").plural("ppm").aliases(&["parts_per_million"]));

        self.edge("pair", "unity", "2");
        self.edge("dozen", "unity", "12");
        self.edge("score", "unity", "20");
        self.edge("gross", "dozen", "12");
        self.edge("hundred", "unity", "100");
        self.edge("thousand", "unity", "1000");
        self.edge("million", "thousand", "1000");
        self.edge("billion", "million", "1000");
        self.edge("percent", "unity", "0.01");
        self.edge("permille", "unity", "0.001");
        self.edge("ppm", "unity", "1e-6");
    }

    fn seed_length(&mut self) {
        self.unit("meter", UnitDefinition::new("meter", "length").abbrev("m").aliases(&["metre", "metres"]).category("SI").metric());
        self.unit("inch", UnitDefinition::new("inch", "length").plural("inches").abbrev("in").category("US"));
        self.unit("foot", UnitDefinition::new("foot", "length").plural("feet").abbrev("ft").category("US"));
        self.unit("yard", UnitDefinition::new("yard", "length").abbrev("yd").category("US"));
        self.unit("mile", UnitDefinition::new("mile", "length").abbrev("mi").category("US"));
        self.unit("nautical_mile", UnitDefinition::new("nautical_mile", "length").abbrev("nmi").category("nautical"));
        self.unit("furlong", UnitDefinition::new("furlong", "length").category("US"));
        self.unit("fathom", UnitDefinition::new("fathom", "length").abbrev("ftm").category("nautical"));
        self.unit("chain", UnitDefinition::new("chain", "length").abbrev("ch").category("US"));
        self.unit("rod", UnitDefinition::new("rod", "length").aliases(&["pole", "perch"]).category("US"));
        self.unit("league", UnitDefinition::new("league", "length").category("US"));
        self.unit("hand", UnitDefinition::new("hand", "length").category("US"));
        self.unit("mil", UnitDefinition::new("mil", "length").aliases(&["thou"]).category("US"));
        self.unit("angstrom", UnitDefinition::new("angstrom", "length").aliases(&["Å"]).category("science"));
        self.unit("astronomical_unit", UnitDefinition::new("astronomical_unit", "length").abbrev("au").category("astronomy"));
        self.unit("light_year", UnitDefinition::new("light_year", "length").abbrev("ly").category("astronomy").metric());
        self.unit("parsec", UnitDefinition::new("parsec", "length").abbrev("pc").category("astronomy").metric());

        self.edge("inch", "meter", "0.0254");
        self.edge("foot", "inch", "12");
        self.edge("yard", "foot", "3");
        self.edge("mile", "foot", "5280");
        self.edge("nautical_mile", "meter", "1852");
        self.edge("furlong", "yard", "220");
        self.edge("fathom", "foot", "6");
        self.edge("chain", "yard", "22");
        self.edge("rod", "yard", "5.5");
        self.edge("league", "mile", "3");
        self.edge("hand", "inch", "4");
        self.edge("mil", "inch", "0.001");
        self.edge("angstrom", "meter", "1e-10");
        self.edge("astronomical_unit", "meter", "149597870700");
        self.edge("light_year", "meter", "9460730472580800");
        self.edge("parsec", "meter", "30856775814913673");
    }

    fn seed_mass(&mut self) {
        self.unit("kilogram", UnitDefinition::new("kilogram", "mass").abbrev("kg").aliases(&["kilogramme"]).category("SI"));
        self.unit("gram", UnitDefinition::new("gram", "mass").abbrev("g").aliases(&["gramme"]).category("SI").metric());
        self.unit("pound", UnitDefinition::new("pound", "mass").abbrev("lb").aliases(&["lbs"]).category("US"));
        self.unit("ounce", UnitDefinition::new("ounce", "mass").abbrev("oz").category("US"));
        self.unit("stone", UnitDefinition::new("stone", "mass").plural("stone").abbrev("st").category("imperial"));
        self.unit("ton", UnitDefinition::new("ton", "mass").aliases(&["short_ton"]).category("US"));
        self.unit("tonne", UnitDefinition::new("tonne", "mass").abbrev("t").aliases(&["metric_ton"]).category("SI"));
        self.unit("grain", UnitDefinition::new("grain", "mass").abbrev("gr").category("US"));
        self.unit("carat", UnitDefinition::new("carat", "mass").abbrev("ct").category("jewelry"));
        self.unit("slug", UnitDefinition::new("slug", "mass").category("US"));

        self.edge("kilogram", "gram", "1000");
        self.edge("pound", "kilogram", "0.45359237");
        self.edge("ounce", "pound", "1/16");
        self.edge("stone", "pound", "14");
        self.edge("ton", "pound", "2000");
        self.edge("tonne", "kilogram", "1000");
        self.edge("grain", "pound", "1/7000");
        self.edge("carat", "gram", "0.2");
        self.edge("slug", "kilogram", "14.593903");
    }

    fn seed_time(&mut self) {
        self.unit("second", UnitDefinition::new("second", "time").abbrev("s").aliases(&["sec", "secs"]).category("SI").metric());
        self.unit("minute", UnitDefinition::new("minute", "time").aliases(&["mins"]));
        self.unit("hour", UnitDefinition::new("hour", "time").abbrev("hr").aliases(&["hrs"]));
        self.unit("day", UnitDefinition::new("day", "time"));
        self.unit("week", UnitDefinition::new("week", "time").abbrev("wk"));
        self.unit("fortnight", UnitDefinition::new("fortnight", "time"));
        self.unit("month", UnitDefinition::new("month", "time").abbrev("mo"));
        self.unit("year", UnitDefinition::new("year", "time").abbrev("yr").aliases(&["annum"]));
        self.unit("decade", UnitDefinition::new("decade", "time"));
        self.unit("century", UnitDefinition::new("century", "time").plural("centuries"));
        self.unit("millennium", UnitDefinition::new("millennium", "time").plural("millennia"));

        self.edge("minute", "second", "60");
        self.edge("hour", "minute", "60");
        self.edge("day", "hour", "24");
        self.edge("week", "day", "7");
        self.edge("fortnight", "day", "14");
        self.edge("year", "day", "365.25");
        self.edge("month", "year", "1/12");
        self.edge("decade", "year", "10");
        self.edge("century", "year", "100");
        self.edge("millennium", "year", "1000");
    }

    fn seed_current(&mut self) {
        self.unit("ampere", UnitDefinition::new("ampere", "current").abbrev("A").aliases(&["amp", "amps"]).category("SI").metric());
        self.unit("abampere", UnitDefinition::new("abampere", "current").aliases(&["biot"]).category("CGS"));

        self.edge("abampere", "ampere", "10");
    }

    fn seed_temperature(&mut self) {
        self.unit("kelvin", UnitDefinition::new("kelvin", "temperature").abbrev("K").category("SI").metric());
        self.unit("celsius", UnitDefinition::new("celsius", "temperature").plural("celsius").abbrev("degC").aliases(&["centigrade"]));
        self.unit("fahrenheit", UnitDefinition::new("fahrenheit", "temperature").plural("fahrenheit").abbrev("degF"));
        self.unit("rankine", UnitDefinition::new("rankine", "temperature").plural("rankine").abbrev("degR"));

        self.edge("rankine", "kelvin", "5/9");
    }

    fn seed_angle(&mut self) {
        self.unit("radian", UnitDefinition::new("radian", "angle").abbrev("rad").category("SI").metric());
        self.unit("degree", UnitDefinition::new("degree", "angle").abbrev("deg").aliases(&["°"]));
        self.unit("arcminute", UnitDefinition::new("arcminute", "angle").abbrev("arcmin"));
        self.unit("arcsecond", UnitDefinition::new("arcsecond", "angle").abbrev("arcsec"));
        self.unit("grad", UnitDefinition::new("grad", "angle").aliases(&["gon", "gradian"]));
        self.unit("revolution", UnitDefinition::new("revolution", "angle").abbrev("rev").aliases(&["turn", "turns"]));
        self.unit("quadrant", UnitDefinition::new("quadrant", "angle"));

        // pi/180 to 60 places
        self.edge("degree", "radian", "0.017453292519943295769236907684886127134428718885417254560972");
        self.edge("arcminute", "degree", "1/60");
        self.edge("arcsecond", "arcminute", "1/60");
        self.edge("grad", "degree", "0.9");
        self.edge("revolution", "degree", "360");
        self.edge("quadrant", "degree", "90");
    }

    fn seed_luminosity(&mut self) {
        self.unit("candela", UnitDefinition::new("candela", "luminous_intensity").abbrev("cd").category("SI").metric());
        self.unit("candlepower", UnitDefinition::new("candlepower", "luminous_intensity").plural("candlepower").abbrev("cp"));

        self.edge("candlepower", "candela", "0.981");
    }

    fn seed_amount(&mut self) {
        self.unit("mole", UnitDefinition::new("mole", "amount_of_substance").abbrev("mol").category("SI").metric());
    }

    fn seed_information(&mut self) {
        self.unit("bit", UnitDefinition::new("bit", "information").abbrev("b").data());
        self.unit("byte", UnitDefinition::new("byte", "information").abbrev("B").aliases(&["octet", "octets"]).data());
        self.unit("nibble", UnitDefinition::new("nibble", "information").aliases(&["nybble"]));

        self.edge("byte", "bit", "8");
        self.edge("nibble", "bit", "4");
    }

    fn seed_area(&mut self) {
        self.unit("are", UnitDefinition::new("are", "area").abbrev("a").category("SI").metric());
        self.unit("acre", UnitDefinition::new("acre", "area").abbrev("ac").category("US"));
        self.unit("barn", UnitDefinition::new("barn", "area").category("science"));

        self.edge("are", "square_meter", "100");
        self.edge("acre", "square_foot", "43560");
        self.edge("barn", "square_meter", "1e-28");
    }

    fn seed_volume(&mut self) {
        self.unit("liter", UnitDefinition::new("liter", "volume").abbrev("l").aliases(&["L", "litre", "litres"]).category("SI").metric());
        self.unit("gallon", UnitDefinition::new("gallon", "volume").abbrev("gal").category("US"));
        self.unit("quart", UnitDefinition::new("quart", "volume").abbrev("qt").category("US"));
        self.unit("pint", UnitDefinition::new("pint", "volume").abbrev("pt").category("US"));
        self.unit("cup", UnitDefinition::new("cup", "volume").category("US"));
        self.unit("fluid_ounce", UnitDefinition::new("fluid_ounce", "volume").abbrev("floz").category("US"));
        self.unit("tablespoon", UnitDefinition::new("tablespoon", "volume").abbrev("tbsp").category("US"));
        self.unit("teaspoon", UnitDefinition::new("teaspoon", "volume").abbrev("tsp").category("US"));
        self.unit("barrel", UnitDefinition::new("barrel", "volume").abbrev("bbl").category("US"));
        self.unit("imperial_gallon", UnitDefinition::new("imperial_gallon", "volume").category("imperial"));

        self.edge("liter", "cubic_meter", "0.001");
        self.edge("gallon", "cubic_inch", "231");
        self.edge("quart", "gallon", "0.25");
        self.edge("pint", "quart", "0.5");
        self.edge("cup", "pint", "0.5");
        self.edge("fluid_ounce", "cup", "0.125");
        self.edge("tablespoon", "fluid_ounce", "0.5");
        self.edge("teaspoon", "tablespoon", "1/3");
        self.edge("barrel", "gallon", "42");
        self.edge("imperial_gallon", "liter", "4.54609");
    }

    fn seed_velocity(&mut self) {
        self.unit("meter_per_second", UnitDefinition::new("meter_per_second", "velocity")
            .plural("meters_per_second").aliases(&["m/s", "mps"]).category("SI"));
        self.unit("knot", UnitDefinition::new("knot", "velocity").abbrev("kn").category("nautical"));
        self.unit("mile_per_hour", UnitDefinition::new("mile_per_hour", "velocity")
            .plural("miles_per_hour").abbrev("mph").category("US"));
        self.unit("kilometer_per_hour", UnitDefinition::new("kilometer_per_hour", "velocity")
            .plural("kilometers_per_hour").abbrev("kph").aliases(&["km/h"]));
        self.unit("foot_per_second", UnitDefinition::new("foot_per_second", "velocity")
            .plural("feet_per_second").abbrev("fps").category("US"));
        self.unit("speed_of_light", UnitDefinition::new("speed_of_light", "velocity").plural("speed_of_light"));
        self.unit("mach", UnitDefinition::new("mach", "velocity").plural("mach"));

        self.edge("knot", "meter_per_second", "1852/3600");
        self.edge("mile_per_hour", "meter_per_second", "0.44704");
        self.edge("kilometer_per_hour", "meter_per_second", "1/3.6");
        self.edge("foot_per_second", "meter_per_second", "0.3048");
        self.edge("speed_of_light", "meter_per_second", "299792458");
        self.edge("mach", "meter_per_second", "343");
    }

    fn seed_acceleration(&mut self) {
        self.unit("meter_per_second_squared", UnitDefinition::new("meter_per_second_squared", "acceleration")
            .plural("meters_per_second_squared").aliases(&["m/s^2"]).category("SI"));
        self.unit("galileo", UnitDefinition::new("galileo", "acceleration").abbrev("Gal").category("CGS"));
        self.unit("standard_gravity", UnitDefinition::new("standard_gravity", "acceleration")
            .plural("standard_gravities").aliases(&["gee", "gees"]));

        self.edge("galileo", "meter_per_second_squared", "0.01");
        self.edge("standard_gravity", "meter_per_second_squared", "9.80665");
    }

    fn seed_force(&mut self) {
        self.unit("newton", UnitDefinition::new("newton", "force").abbrev("N").category("SI").metric());
        self.unit("dyne", UnitDefinition::new("dyne", "force").abbrev("dyn").category("CGS"));
        self.unit("pound_force", UnitDefinition::new("pound_force", "force").plural("pounds_force").abbrev("lbf").category("US"));
        self.unit("kilogram_force", UnitDefinition::new("kilogram_force", "force").plural("kilograms_force").abbrev("kgf"));
        self.unit("poundal", UnitDefinition::new("poundal", "force").abbrev("pdl"));

        self.edge("dyne", "newton", "1e-5");
        self.edge("pound_force", "newton", "4.4482216152605");
        self.edge("kilogram_force", "newton", "9.80665");
        self.edge("poundal", "newton", "0.138254954376");
    }

    fn seed_energy(&mut self) {
        self.unit("joule", UnitDefinition::new("joule", "energy").abbrev("J").category("SI").metric());
        self.unit("calorie", UnitDefinition::new("calorie", "energy").abbrev("cal").metric());
        self.unit("british_thermal_unit", UnitDefinition::new("british_thermal_unit", "energy").abbrev("btu").aliases(&["BTU"]));
        self.unit("erg", UnitDefinition::new("erg", "energy").category("CGS"));
        self.unit("electron_volt", UnitDefinition::new("electron_volt", "energy").abbrev("eV").category("science").metric());
        self.unit("watt_hour", UnitDefinition::new("watt_hour", "energy").abbrev("Wh").metric());
        self.unit("therm", UnitDefinition::new("therm", "energy").category("US"));

        self.edge("calorie", "joule", "4.184");
        self.edge("british_thermal_unit", "joule", "1055.05585262");
        self.edge("erg", "joule", "1e-7");
        self.edge("electron_volt", "joule", "1.602176634e-19");
        self.edge("watt_hour", "joule", "3600");
        self.edge("therm", "british_thermal_unit", "100000");
    }

    fn seed_power(&mut self) {
        self.unit("watt", UnitDefinition::new("watt", "power").abbrev("W").category("SI").metric());
        self.unit("horsepower", UnitDefinition::new("horsepower", "power").plural("horsepower").abbrev("hp"));
        self.unit("dBm", UnitDefinition::new("dBm", "power").plural("dBm").aliases(&["decibel_milliwatt"]));

        self.edge("horsepower", "watt", "745.69987158227022");
    }

    fn seed_pressure(&mut self) {
        self.unit("pascal", UnitDefinition::new("pascal", "pressure").abbrev("Pa").category("SI").metric());
        self.unit("bar", UnitDefinition::new("bar", "pressure").metric());
        self.unit("atmosphere", UnitDefinition::new("atmosphere", "pressure").abbrev("atm"));
        self.unit("psi", UnitDefinition::new("psi", "pressure").plural("psi").aliases(&["pound_per_square_inch"]).category("US"));
        self.unit("torr", UnitDefinition::new("torr", "pressure").plural("torr").aliases(&["Torr"]));
        self.unit("millimeter_of_mercury", UnitDefinition::new("millimeter_of_mercury", "pressure")
            .plural("millimeters_of_mercury").aliases(&["mmHg"]));

        self.edge("bar", "pascal", "100000");
        self.edge("atmosphere", "pascal", "101325");
        self.edge("psi", "pascal", "6894.757293168361");
        self.edge("torr", "atmosphere", "1/760");
        self.edge("millimeter_of_mercury", "pascal", "133.322387415");
    }

    fn seed_frequency(&mut self) {
        self.unit("hertz", UnitDefinition::new("hertz", "frequency").plural("hertz").abbrev("Hz").category("SI").metric());
    }

    fn seed_electrical(&mut self) {
        self.unit("coulomb", UnitDefinition::new("coulomb", "charge").abbrev("C").category("SI").metric());
        self.unit("ampere_hour", UnitDefinition::new("ampere_hour", "charge").abbrev("Ah").metric());
        self.unit("volt", UnitDefinition::new("volt", "electric_potential").abbrev("V").category("SI").metric());
        self.unit("ohm", UnitDefinition::new("ohm", "resistance").aliases(&["Ω"]).category("SI").metric());

        self.edge("ampere_hour", "coulomb", "3600");
    }
}

// ========== Nonlinear Conversions ==========

/// Declared nonlinear conversions, both directions listed explicitly.
/// Not part of the persisted artifact; reattached on load.
pub fn standard_nonlinear() -> Vec<(&'static str, &'static str, NonlinearFn)> {
    vec![
        ("celsius", "kelvin", celsius_to_kelvin as NonlinearFn),
        ("kelvin", "celsius", kelvin_to_celsius),
        ("fahrenheit", "kelvin", fahrenheit_to_kelvin),
        ("kelvin", "fahrenheit", kelvin_to_fahrenheit),
        ("celsius", "fahrenheit", celsius_to_fahrenheit),
        ("fahrenheit", "celsius", fahrenheit_to_celsius),
        ("celsius", "rankine", celsius_to_rankine),
        ("rankine", "celsius", rankine_to_celsius),
        ("fahrenheit", "rankine", fahrenheit_to_rankine),
        ("rankine", "fahrenheit", rankine_to_fahrenheit),
        ("dBm", "watt", dbm_to_watt),
        ("watt", "dBm", watt_to_dbm),
    ]
}

fn absolute_zero_celsius() -> Number {
    Number::from_ratio(27315, 100)
}

fn absolute_zero_fahrenheit() -> Number {
    Number::from_ratio(45967, 100)
}

fn five_ninths(value: &Number) -> Result<Number, RpnError> {
    Ok(value.mul(&Number::from_i64(5)).checked_div(&Number::from_i64(9))?)
}

fn nine_fifths(value: &Number) -> Number {
    value.mul(&Number::from_ratio(9, 5))
}

fn celsius_to_kelvin(value: &Number, _precision: u32) -> Result<Number, RpnError> {
    Ok(value.add(&absolute_zero_celsius()))
}

fn kelvin_to_celsius(value: &Number, _precision: u32) -> Result<Number, RpnError> {
    Ok(value.sub(&absolute_zero_celsius()))
}

fn fahrenheit_to_kelvin(value: &Number, _precision: u32) -> Result<Number, RpnError> {
    five_ninths(&value.add(&absolute_zero_fahrenheit()))
}

fn kelvin_to_fahrenheit(value: &Number, _precision: u32) -> Result<Number, RpnError> {
    Ok(nine_fifths(value).sub(&absolute_zero_fahrenheit()))
}

fn celsius_to_fahrenheit(value: &Number, _precision: u32) -> Result<Number, RpnError> {
    Ok(nine_fifths(value).add(&Number::from_i64(32)))
}

fn fahrenheit_to_celsius(value: &Number, _precision: u32) -> Result<Number, RpnError> {
    five_ninths(&value.sub(&Number::from_i64(32)))
}

fn celsius_to_rankine(value: &Number, _precision: u32) -> Result<Number, RpnError> {
    Ok(nine_fifths(&value.add(&absolute_zero_celsius())))
}

fn rankine_to_celsius(value: &Number, _precision: u32) -> Result<Number, RpnError> {
    Ok(five_ninths(value)?.sub(&absolute_zero_celsius()))
}

fn fahrenheit_to_rankine(value: &Number, _precision: u32) -> Result<Number, RpnError> {
    Ok(value.add(&absolute_zero_fahrenheit()))
}

fn rankine_to_fahrenheit(value: &Number, _precision: u32) -> Result<Number, RpnError> {
    Ok(value.sub(&absolute_zero_fahrenheit()))
}

/// `10^(dBm/10)` milliwatts
fn dbm_to_watt(value: &Number, precision: u32) -> Result<Number, RpnError> {
    let exponent = value.checked_div(&Number::from_i64(10))?;
    let milliwatts = Number::from_i64(10).pow_real(&exponent, precision)?;
    Ok(milliwatts.checked_div(&Number::from_i64(1000))?)
}

fn watt_to_dbm(value: &Number, precision: u32) -> Result<Number, RpnError> {
    if value.is_zero() || value.is_negative() {
        return Err(RpnError::domain("dBm is undefined for non-positive power"));
    }
    let milliwatts = value.mul(&Number::from_i64(1000));
    Ok(milliwatts.log10(precision)?.mul(&Number::from_i64(10)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_dimensions() {
        let builder = standard_builder().unwrap();
        assert!(builder.seed_count() > 80);
    }

    #[test]
    fn test_temperature_functions() {
        let boiling = Number::from_i64(100);
        assert_eq!(celsius_to_fahrenheit(&boiling, 50).unwrap(), Number::from_i64(212));
        assert_eq!(fahrenheit_to_celsius(&Number::from_i64(212), 50).unwrap(), boiling);
        assert_eq!(celsius_to_kelvin(&boiling, 50).unwrap(), Number::from_str("373.15").unwrap());
        assert_eq!(rankine_to_fahrenheit(&Number::from_str("459.67").unwrap(), 50).unwrap(), Number::from_i64(0));
    }

    #[test]
    fn test_dbm_functions() {
        let one_watt = dbm_to_watt(&Number::from_i64(30), 50).unwrap();
        assert_eq!(one_watt.round(), Number::from_i64(1));
        let dbm = watt_to_dbm(&Number::from_i64(1), 50).unwrap();
        assert_eq!(dbm.round(), Number::from_i64(30));
        assert!(watt_to_dbm(&Number::from_i64(0), 50).is_err());
    }
}
