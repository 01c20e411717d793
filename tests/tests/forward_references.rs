use pretty_assertions::assert_eq;
use tests::prelude::*;

const POSTS: &str = r#"
<mapper namespace="posts">
  <resultMap id="detailed" type="Post" extends="blogs.base">
    <result property="subject" column="subject"/>
    <association property="author" resultMap="authors.author"/>
  </resultMap>

  <select id="find" resultMap="detailed">
    select * from posts where id = #{id}
  </select>
</mapper>
"#;

const BLOGS: &str = r#"
<mapper namespace="blogs">
  <resultMap id="base" type="Post">
    <id property="id" column="id"/>
  </resultMap>
</mapper>
"#;

const AUTHORS: &str = r#"
<mapper namespace="authors">
  <resultMap id="author" type="Author">
    <id property="id" column="author_id"/>
    <result property="username" column="username"/>
  </resultMap>
</mapper>
"#;

#[test]
fn parent_result_map_loaded_later() {
    let mut test = MapperTest::new(fixtures::builder());

    assert_ok!(test.load("posts.xml", POSTS));

    // The result map waits for its parent and the statement for the map.
    assert_eq!(test.config.pending_len(), 2);
    assert_err!(test.config.result_map("posts.detailed"));
    assert_err!(test.config.statement("posts.find"));

    assert_ok!(test.load_all(&[("blogs.xml", BLOGS), ("authors.xml", AUTHORS)]));
    assert_eq!(test.config.pending_len(), 0);
    assert_ok!(test.finish());

    let detailed = assert_ok!(test.config.result_map("posts.detailed"));
    let properties: Vec<_> = detailed
        .mappings
        .iter()
        .filter_map(|mapping| mapping.property.as_deref())
        .collect();
    assert_eq!(properties, ["subject", "author", "id"]);
    assert!(detailed.has_nested_result_maps());

    let find = assert_ok!(test.config.statement("posts.find"));
    assert_eq!(find.result_maps[0].id, "posts.detailed");
    assert!(find.has_nested_result_maps());
}

#[test]
fn load_order_does_not_matter() {
    let orders: [[(&str, &str); 3]; 3] = [
        [("posts.xml", POSTS), ("blogs.xml", BLOGS), ("authors.xml", AUTHORS)],
        [("authors.xml", AUTHORS), ("posts.xml", POSTS), ("blogs.xml", BLOGS)],
        [("blogs.xml", BLOGS), ("authors.xml", AUTHORS), ("posts.xml", POSTS)],
    ];

    for order in orders {
        let mut test = MapperTest::new(fixtures::builder());
        assert_ok!(test.load_all(&order));
        assert_ok!(test.finish());

        assert_eq!(test.config.statements().len(), 1);
        assert_eq!(test.config.result_maps().len(), 3);
    }
}

#[test]
fn missing_unit_fails_at_finish() {
    let mut test = MapperTest::new(fixtures::builder());
    assert_ok!(test.load("posts.xml", POSTS));

    let err = assert_err!(test.finish());
    assert!(err.is_unresolved_reference());
    assert!(
        err.to_string().contains("result map 'posts.detailed' in 'posts.xml'"),
        "{err}"
    );
    assert!(err.to_string().contains("blogs.base"), "{err}");
    assert!(!test.config.is_finished());
}

#[test]
fn nested_map_reference_is_checked_at_finish() {
    let mut test = MapperTest::new(fixtures::builder());

    // Both parents exist, but nothing defines `authors.author`.
    assert_ok!(test.load_all(&[("blogs.xml", BLOGS), ("posts.xml", POSTS)]));
    assert_eq!(test.config.pending_len(), 0);

    let err = assert_err!(test.finish());
    assert!(err.is_unresolved_reference());
    assert!(err.to_string().contains("authors.author"), "{err}");
}

#[test]
fn statement_waits_for_parameter_map() {
    let mut test = MapperTest::new(fixtures::builder());

    assert_ok!(test.load(
        "posts.xml",
        r#"<mapper namespace="posts">
             <update id="rename" parameterMap="params.rename">update posts set subject = ? where id = ?</update>
           </mapper>"#,
    ));
    assert_eq!(test.config.pending_len(), 1);

    assert_ok!(test.load(
        "params.xml",
        r#"<mapper namespace="params">
             <parameterMap id="rename" type="Post">
               <parameter property="subject"/>
               <parameter property="id"/>
             </parameterMap>
           </mapper>"#,
    ));
    assert_ok!(test.finish());

    let rename = assert_ok!(test.config.statement("posts.rename"));
    let mappings = &assert_some!(rename.parameter_map.as_ref()).mappings;
    let types: Vec<_> = mappings
        .iter()
        .map(|mapping| mapping.java_type.as_str())
        .collect();
    assert_eq!(types, ["string", "i32"]);
}
