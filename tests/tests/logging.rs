use tests::prelude::*;
use tracing::Level;

#[test]
fn deferrals_are_not_warnings() {
    let mut test = MapperTest::new(fixtures::builder());

    assert_ok!(test.load(
        "posts.xml",
        r#"<mapper namespace="posts">
             <resultMap id="post" type="Post" extends="base.post"/>
             <select id="all" resultMap="post">select * from posts</select>
           </mapper>"#,
    ));
    assert!(test.log.contains(Level::DEBUG, "deferring"));
    assert!(test.log.at_least(Level::WARN).is_empty());

    assert_ok!(test.load(
        "base.xml",
        r#"<mapper namespace="base">
             <resultMap id="post" type="Post"><id property="id" column="id"/></resultMap>
           </mapper>"#,
    ));
    assert_ok!(test.finish());

    assert!(test.log.contains(Level::DEBUG, "resolved deferred item"));
    assert!(test.log.contains(Level::INFO, "configuration finished"));
    assert!(test.log.at_least(Level::WARN).is_empty());
}

#[test]
fn each_resource_is_logged() {
    let mut test = MapperTest::new(fixtures::builder());

    assert_ok!(test.load("a.xml", r#"<mapper namespace="a"/>"#));
    assert_ok!(test.load("a.xml", r#"<mapper namespace="a"/>"#));

    assert!(test.log.contains(Level::DEBUG, "loaded mapping resource"));
    assert!(test.log.contains(Level::DEBUG, "resource already loaded"));
}
