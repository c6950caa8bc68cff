//! GeoPackage container DDL.
//!
//! Only the parts of the format an attributes-only package needs: the
//! header pragmas, the spatial reference registry with its three mandatory
//! rows and the contents registry. Layer tables are created on write.

/// `GPKG` in ASCII.
pub const APPLICATION_ID: i32 = 0x4750_4B47;

/// GeoPackage 1.3.
pub const USER_VERSION: i32 = 10300;

/// Registry DDL; idempotent thanks to `IF NOT EXISTS` and
/// `INSERT OR IGNORE`. The header pragmas are set separately.
pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS gpkg_spatial_ref_sys (
    srs_name                 TEXT    NOT NULL,
    srs_id                   INTEGER NOT NULL PRIMARY KEY,
    organization             TEXT    NOT NULL,
    organization_coordsys_id INTEGER NOT NULL,
    definition               TEXT    NOT NULL,
    description              TEXT
);

INSERT OR IGNORE INTO gpkg_spatial_ref_sys VALUES
    ('Undefined cartesian SRS', -1, 'NONE', -1, 'undefined', NULL),
    ('Undefined geographic SRS', 0, 'NONE', 0, 'undefined', NULL),
    ('WGS 84 geodetic', 4326, 'EPSG', 4326,
     'GEOGCS[\"WGS 84\",DATUM[\"WGS_1984\",SPHEROID[\"WGS 84\",6378137,298.257223563]],PRIMEM[\"Greenwich\",0],UNIT[\"degree\",0.0174532925199433]]',
     NULL);

-- One row per layer; registry layers are all 'attributes'.
CREATE TABLE IF NOT EXISTS gpkg_contents (
    table_name  TEXT     NOT NULL PRIMARY KEY,
    data_type   TEXT     NOT NULL,
    identifier  TEXT     UNIQUE,
    description TEXT     DEFAULT '',
    last_change DATETIME NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
    min_x       DOUBLE,
    min_y       DOUBLE,
    max_x       DOUBLE,
    max_y       DOUBLE,
    srs_id      INTEGER  REFERENCES gpkg_spatial_ref_sys(srs_id)
);
";

/// Primary key column every layer table carries.
pub const FID: &str = "fid";
