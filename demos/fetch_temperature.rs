//! Fetches daily temperatures for one field boundary and prints the unnested table.
//!
//! Run with `GEOMEASURES_API_KEY=<key> cargo run --example fetch_temperature`.

use geomeasures::{GeoMeasuresError, GraphQlClient};
use serde_json::json;
use std::env;
use std::time::Duration;

const QUERY: &str = r#"
query getTemperature($boundary: GeoJSON!) {
  geospatialMeasures(geoFilter: { location: $boundary, operation: INTERSECTS }) {
    temperatureMean(where: { datapoints: { date: { GE: "2018-01-01", LE: "2018-01-31" } } }) {
      unit
      datapoints { date value unit }
      location { centroid }
    }
    temperatureMax(where: { datapoints: { date: { GE: "2018-01-01", LE: "2018-01-31" } } }) {
      unit
      datapoints { date value unit }
      location { centroid }
    }
  }
}
"#;

#[tokio::main]
async fn main() -> Result<(), GeoMeasuresError> {
    let Ok(api_key) = env::var("GEOMEASURES_API_KEY") else {
        eprintln!("Set GEOMEASURES_API_KEY to run this example");
        return Ok(());
    };

    let client = GraphQlClient::builder()
        .api_key(api_key)
        .timeout(Duration::from_secs(60))
        .build()?;

    let boundary = json!({
        "type": "Polygon",
        "coordinates": [[
            [-0.3948, 51.8076], [-0.3748, 51.8076], [-0.3748, 51.8176],
            [-0.3948, 51.8176], [-0.3948, 51.8076]
        ]]
    });
    let response = client
        .fetch_measures(QUERY)
        .variables(json!({ "boundary": boundary }))
        .call()
        .await?;

    let tables = response
        .time_series_measures(&["temperatureMean", "temperatureMax"])
        .call()?;
    println!("{:#?}", tables[0].to_dataframe()?);

    Ok(())
}
