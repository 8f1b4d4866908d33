//! Flattens a soil query response and writes it as a shapefile-safe CSV.

use geomeasures::{write_table, Alignment, ExportFormat, GeoMeasuresError, QueryResponse, SHAPEFILE_FIELD_LENGTH};
use std::env;

const RESPONSE: &str = r#"{
  "data": {
    "geospatialMeasures": {
      "soilPH": [
        { "unit": "pH", "value": 6.1, "location": { "centroid": [-0.3848, 51.8126] } },
        { "unit": "pH", "value": 5.7, "location": { "centroid": [-0.3798, 51.8126] } }
      ],
      "soilTotalAbundanceOfInvertebrates": [
        { "unit": "count", "value": 120, "location": { "centroid": [-0.3848, 51.8126] } },
        { "unit": "count", "value": 95, "location": { "centroid": [-0.3798, 51.8126] } }
      ]
    }
  }
}"#;

fn main() -> Result<(), GeoMeasuresError> {
    configure_polars_display();
    let response: QueryResponse = RESPONSE.parse()?;

    let tables = response
        .scalar_measures(&["soilPH", "soilTotalAbundanceOfInvertebrates"])
        .alignment(Alignment::CoRegistered)
        .call()?;
    let table = &tables[0];
    println!("{:#?}", table.to_dataframe_normalized(SHAPEFILE_FIELD_LENGTH)?);

    let path = env::temp_dir().join("soil.csv");
    write_table()
        .table(table)
        .path(&path)
        .format(ExportFormat::Csv)
        .max_field_length(SHAPEFILE_FIELD_LENGTH)
        .call()?;
    println!("Wrote {} records to {}", table.len(), path.display());

    Ok(())
}

fn configure_polars_display() {
    // show every column
    env::set_var("POLARS_FMT_MAX_COLS", "-1");
}
