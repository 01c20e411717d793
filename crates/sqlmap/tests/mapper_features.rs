use pretty_assertions::assert_eq;
use serde_json::json;
use sqlmap::{core::mapping::ParameterMode, Configuration, Settings, Value};
use std_util::prelude::*;

fn configuration(settings: &str) -> Configuration {
    assert_ok!(Configuration::builder()
        .settings(assert_ok!(Settings::from_json(settings)))
        .variable("schema", "main")
        .build())
}

#[test]
fn include_with_properties() {
    let mut config = configuration("{}");
    assert_ok!(config.load(
        "users.xml",
        r#"<mapper namespace="users">
             <sql id="columns">${alias}.id, ${alias}.name</sql>
             <sql id="from">from <include refid="table"/></sql>
             <sql id="table">${schema}.users</sql>
             <select id="all" resultType="map">
               select <include refid="columns"><property name="alias" value="u"/></include>
               <include refid="from"/> u
             </select>
           </mapper>"#,
    ));
    assert_ok!(config.finish());

    let statement = assert_ok!(config.statement("users.all"));
    assert!(!statement.is_dynamic());

    let bound = assert_ok!(config.bound_sql("users.all", &Value::Null));
    assert_sql_eq!(bound.sql(), "select u.id, u.name from main.users u");
}

#[test]
fn include_property_defined_twice() {
    let mut config = configuration("{}");
    let err = assert_err!(config.load(
        "users.xml",
        r#"<mapper namespace="users">
             <sql id="columns">${alias}.id</sql>
             <select id="all">
               select <include refid="columns">
                 <property name="alias" value="u"/>
                 <property name="alias" value="v"/>
               </include> from users
             </select>
           </mapper>"#,
    ));
    assert!(err.is_invalid_mapping());
}

#[test]
fn circular_include() {
    let mut config = configuration("{}");
    let err = assert_err!(config.load(
        "users.xml",
        r#"<mapper namespace="users">
             <sql id="a">a <include refid="b"/></sql>
             <sql id="b">b <include refid="a"/></sql>
             <select id="all">select <include refid="a"/></select>
           </mapper>"#,
    ));
    assert!(err.is_invalid_mapping());
    assert!(err.to_string().contains("circular"), "{err}");
}

#[test]
fn missing_fragment_defers_until_finish() {
    let mut config = configuration("{}");
    assert_ok!(config.load(
        "users.xml",
        r#"<mapper namespace="users">
             <select id="all">select <include refid="shared.columns"/> from users</select>
           </mapper>"#,
    ));
    assert_eq!(config.pending_len(), 1);
    assert!(config.statement("users.all").is_err());

    let err = assert_err!(config.finish());
    assert!(err.is_unresolved_reference());
    assert!(err.to_string().contains("statement 'all' in 'users.xml'"), "{err}");
    assert!(err.to_string().contains("shared.columns"), "{err}");
    assert!(!config.is_finished());
}

#[test]
fn short_names_are_ambiguous_across_namespaces() {
    let mut config = configuration("{}");
    assert_ok!(config.load(
        "a.xml",
        r#"<mapper namespace="a"><select id="find">select 1</select></mapper>"#,
    ));
    assert_ok!(config.load(
        "b.xml",
        r#"<mapper namespace="b"><select id="find">select 2</select></mapper>"#,
    ));
    assert_ok!(config.finish());

    assert_ok!(config.statement("a.find"));
    assert_ok!(config.statement("b.find"));

    let err = assert_err!(config.statement("find"));
    assert!(err.to_string().contains("ambiguous"), "{err}");
}

#[test]
fn dotted_definitions_must_use_the_namespace() {
    let mut config = configuration("{}");
    assert_ok!(config.load(
        "a.xml",
        r#"<mapper namespace="a"><select id="a.find">select 1</select></mapper>"#,
    ));
    assert_ok!(config.statement("a.find"));

    let err = assert_err!(config.load(
        "b.xml",
        r#"<mapper namespace="b"><select id="c.find">select 1</select></mapper>"#,
    ));
    assert!(err.is_invalid_mapping());
}

#[test]
fn parameter_maps() {
    let mut config = configuration("{}");
    assert_ok!(config.load(
        "procs.xml",
        r#"<mapper namespace="procs">
             <resultMap id="row" type="map"><result property="id" column="id"/></resultMap>
             <parameterMap id="args" type="map">
               <parameter property="id" javaType="long" mode="IN"/>
               <parameter property="rows" jdbcType="CURSOR" mode="OUT" resultMap="row"/>
             </parameterMap>
             <select id="call" statementType="CALLABLE" parameterMap="args">{ call list_rows(?, ?) }</select>
           </mapper>"#,
    ));
    assert_ok!(config.finish());

    let args = assert_ok!(config.parameter_map("procs.args"));
    assert_eq!(args.mappings.len(), 2);
    assert_eq!(args.mappings[0].java_type.as_str(), "i64");
    assert_eq!(args.mappings[1].mode, ParameterMode::Out);
    assert_eq!(args.mappings[1].java_type.as_str(), "cursor");
    assert_eq!(args.mappings[1].result_map_id.as_deref(), Some("procs.row"));

    let bound = assert_ok!(config.bound_sql("procs.call", &Value::from(json!({ "id": 1 }))));
    assert_eq!(bound.sql(), "{ call list_rows(?, ?) }");
    let properties: Vec<_> = bound
        .parameter_mappings()
        .iter()
        .map(|mapping| mapping.property.as_str())
        .collect();
    assert_eq!(properties, ["id", "rows"]);
}

#[test]
fn cache_and_cache_ref() {
    let mut config = configuration("{}");
    assert_ok!(config.load(
        "orders.xml",
        r#"<mapper namespace="orders">
             <cache-ref namespace="users"/>
             <select id="all">select * from orders</select>
           </mapper>"#,
    ));

    // Waiting for the referenced namespace.
    assert_eq!(config.pending_len(), 2);

    assert_ok!(config.load(
        "users.xml",
        r#"<mapper namespace="users">
             <cache eviction="FIFO" flushInterval="60000" size="512" readOnly="true">
               <property name="region" value="eu"/>
             </cache>
             <select id="all">select * from users</select>
           </mapper>"#,
    ));
    assert_eq!(config.pending_len(), 0);
    assert_ok!(config.finish());

    let cache = assert_some!(config.cache("users"));
    assert_eq!(cache.eviction, "FIFO");
    assert_eq!(cache.flush_interval, Some(60000));
    assert_eq!(cache.size, Some(512));
    assert!(!cache.read_write);
    assert_eq!(cache.properties["region"], "eu");

    assert_eq!(config.cache_ref("orders"), Some("users"));
    let orders = assert_ok!(config.statement("orders.all"));
    assert_eq!(assert_some!(orders.cache.as_ref()).id, "users");
}

#[test]
fn unresolved_cache_ref() {
    let mut config = configuration("{}");
    assert_ok!(config.load(
        "orders.xml",
        r#"<mapper namespace="orders"><cache-ref namespace="nowhere"/></mapper>"#,
    ));

    let err = assert_err!(config.finish());
    assert!(err.is_unresolved_reference());
    assert!(err.to_string().contains("nowhere"), "{err}");
}

#[test]
fn database_specific_statements_win() {
    let mut config = configuration(r#"{ "databaseId": "pg" }"#);
    assert_ok!(config.load(
        "users.xml",
        r#"<mapper namespace="users">
             <sql id="limit">limit 10</sql>
             <sql id="limit" databaseId="pg">limit 20</sql>
             <select id="page">select * from users</select>
             <select id="page" databaseId="pg">select * from users <include refid="limit"/></select>
             <select id="page" databaseId="mysql">select * from `users`</select>
             <select id="portable">select 1</select>
           </mapper>"#,
    ));
    assert_ok!(config.finish());

    let page = assert_ok!(config.statement("users.page"));
    assert_eq!(page.database_id.as_deref(), Some("pg"));
    assert_sql_eq!(
        assert_ok!(config.bound_sql("users.page", &Value::Null)).sql(),
        "select * from users limit 20"
    );

    assert_eq!(assert_ok!(config.statement("users.portable")).database_id, None);
    assert_eq!(config.statements().len(), 2);
}

#[test]
fn database_id_binding() {
    let mut config = configuration(r#"{ "databaseId": "pg" }"#);
    assert_ok!(config.load(
        "users.xml",
        r#"<mapper namespace="users">
             <select id="now">
               <choose>
                 <when test="_databaseId == 'pg'">select now()</when>
                 <otherwise>select current_timestamp</otherwise>
               </choose>
             </select>
           </mapper>"#,
    ));

    let bound = assert_ok!(config.bound_sql("users.now", &Value::Null));
    assert_sql_eq!(bound.sql(), "select now()");
}

#[test]
fn settings_change_compilation() {
    let mut config = configuration(
        r#"{ "placeholder": "dollar", "shrinkWhitespacesInSql": true, "defaultFetchSize": 100, "defaultStatementTimeout": 5 }"#,
    );
    assert_ok!(config.load(
        "users.xml",
        r#"<mapper namespace="users">
             <select id="find" timeout="30">
               select *
               from users
               where id = #{id} and name = #{name}
             </select>
           </mapper>"#,
    ));

    let find = assert_ok!(config.statement("users.find"));
    assert_eq!(find.fetch_size, Some(100));
    assert_eq!(find.timeout, Some(30));

    let bound = assert_ok!(config.bound_sql("users.find", &Value::Null));
    assert_eq!(bound.sql(), "select * from users where id = $1 and name = $2");
}

#[test]
fn default_values_in_variables() {
    let mut config = configuration(r#"{ "enableDefaultValue": true }"#);
    assert_ok!(config.load(
        "users.xml",
        r#"<mapper namespace="users">
             <select id="find">select * from ${schema}.${table:users}</select>
           </mapper>"#,
    ));

    let bound = assert_ok!(config.bound_sql("users.find", &Value::Null));
    assert_eq!(bound.sql(), "select * from main.users");
}

#[test]
fn unknown_settings_are_rejected() {
    let err = assert_err!(Settings::from_json(r#"{ "cacheEverything": true }"#));
    assert!(err.to_string().contains("cacheEverything"), "{err}");
}

#[test]
fn loading_after_finish_fails() {
    let mut config = configuration("{}");
    assert_ok!(config.load("a.xml", r#"<mapper namespace="a"/>"#));
    assert_ok!(config.finish());
    assert!(config.is_finished());

    // Finishing twice is harmless.
    assert_ok!(config.finish());

    let err = assert_err!(config.load("b.xml", r#"<mapper namespace="b"/>"#));
    assert!(err.is_invalid_mapping());
}

#[test]
fn failed_resource_can_be_reloaded() {
    let mut config = configuration("{}");
    let mapper = |jdbc_type: &str| {
        format!(
            r#"<mapper namespace="c">
                 <cache/>
                 <sql id="cols">id, name</sql>
                 <select id="later" resultMap="missing">select 1</select>
                 <select id="find" resultType="map">
                   select <include refid="cols"/> from c where id = #{{id,jdbcType={jdbc_type}}}
                 </select>
               </mapper>"#
        )
    };

    let err = assert_err!(config.load("c.xml", &mapper("NOPE")));
    assert!(err.is_invalid_mapping());
    assert!(!config.is_resource_loaded("c.xml"));
    assert!(config.sql_fragment("c.cols").is_err());
    assert!(config.caches().is_empty());
    assert!(config.cache("c").is_none());
    assert_eq!(config.pending_len(), 0);

    assert_ok!(config.load("c.xml", &mapper("INTEGER")));
    assert!(config.is_resource_loaded("c.xml"));
    let bound = assert_ok!(config.bound_sql("c.find", &Value::from(json!({ "id": 1 }))));
    assert_sql_eq!(bound.sql(), "select id, name from c where id = ?");
}

#[test]
fn hard_failures_stay_pending() {
    let mut config = configuration("{}");
    assert_ok!(config.load(
        "a.xml",
        r#"<mapper namespace="a"><select id="find" resultMap="shared">select 1</select></mapper>"#,
    ));
    assert_eq!(config.pending_len(), 1);

    // The deferred statement now collides with one registered by b.xml
    let err = assert_err!(config.load(
        "b.xml",
        r#"<mapper namespace="a">
             <resultMap id="shared" type="map"/>
             <select id="find">select 2</select>
           </mapper>"#,
    ));
    assert!(err.is_redefinition());
    assert_eq!(config.pending_len(), 1);
    assert!(assert_err!(config.finish()).is_redefinition());
}

#[test]
fn loading_a_resource_twice_registers_once() {
    let mut config = configuration("{}");
    let text = r#"<mapper namespace="a"><select id="find">select 1</select></mapper>"#;

    assert_ok!(config.load("a.xml", text));
    assert_ok!(config.load("a.xml", text));
    assert!(config.is_resource_loaded("a.xml"));
    assert_eq!(config.statements().len(), 1);
}
